//! Bar — one OHLCV record for one symbol and one time period.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::table::{ColumnKey, PriceField};

/// OHLCV bar for a single symbol.
///
/// Bars are an input convenience: the engine stores everything in the
/// [`BarTable`](crate::table::BarTable) and `cells()` converts a bar into the
/// `<SYMBOL>_<Field>` columns the table expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic sanity check: high bounds open/close/low, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Table cells for this bar, keyed by price column.
    pub fn cells(&self) -> Vec<(ColumnKey, f64)> {
        [
            (PriceField::Open, self.open),
            (PriceField::High, self.high),
            (PriceField::Low, self.low),
            (PriceField::Close, self.close),
            (PriceField::Volume, self.volume),
        ]
        .into_iter()
        .map(|(field, value)| (ColumnKey::price(&self.symbol, field), value))
        .collect()
    }
}
