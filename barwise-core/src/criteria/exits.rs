//! Exit rules driven by the ledger's per-bar P&L columns.
//!
//! `PL_VALUE` and `PL_PERCENT` hold the raw price move since entry, so the
//! `short` flag flips the comparison. `PL` is already signed by position
//! side (profit is positive for both longs and shorts). A NaN cell means no
//! position to judge and reads as `false`.

use super::{last_matches, Criterion};
use crate::table::{ColumnKey, Metric, TableWindow};

fn move_column(symbol: &str, percent: bool) -> ColumnKey {
    let metric = if percent { Metric::PlPercent } else { Metric::PlValue };
    ColumnKey::metric(metric, symbol)
}

/// Fires once the adverse price move reaches `value` (absolute).
#[derive(Debug, Clone, PartialEq)]
pub struct StopLoss {
    column: ColumnKey,
    value: f64,
    short: bool,
}

impl StopLoss {
    pub fn new(symbol: &str, value: f64) -> Self {
        Self {
            column: move_column(symbol, false),
            value: value.abs(),
            short: false,
        }
    }

    pub fn short(mut self) -> Self {
        self.short = true;
        self
    }

    /// Compare against `PL_PERCENT` (a fraction) instead of `PL_VALUE`.
    pub fn percent(mut self) -> Self {
        if let ColumnKey::Metric { metric, .. } = &mut self.column {
            *metric = Metric::PlPercent;
        }
        self
    }
}

impl Criterion for StopLoss {
    fn name(&self) -> String {
        format!("StopLoss({}, {}, short={})", self.column, self.value, self.short)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(1)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        let value = self.value;
        if self.short {
            last_matches(window, &self.column, |v| v >= value)
        } else {
            last_matches(window, &self.column, |v| v <= -value)
        }
    }
}

/// Fires once profit reaches `value`.
///
/// Reads `PL_<symbol>` (currency) by default; `.percent()` switches to
/// `PL_PERCENT_<symbol>`, where `short` flips the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeProfit {
    column: ColumnKey,
    value: f64,
    short: bool,
}

impl TakeProfit {
    pub fn new(symbol: &str, value: f64) -> Self {
        Self {
            column: ColumnKey::metric(Metric::Pl, symbol),
            value,
            short: false,
        }
    }

    /// Threshold for a short position. Only changes `.percent()` mode:
    /// currency `PL` is already signed by the position side, so the same
    /// threshold applies to both sides there.
    pub fn short(mut self) -> Self {
        self.short = true;
        self
    }

    pub fn percent(mut self) -> Self {
        if let ColumnKey::Metric { metric, .. } = &mut self.column {
            *metric = Metric::PlPercent;
        }
        self
    }

    fn reads_price_move(&self) -> bool {
        matches!(
            self.column,
            ColumnKey::Metric {
                metric: Metric::PlPercent,
                ..
            }
        )
    }
}

impl Criterion for TakeProfit {
    fn name(&self) -> String {
        format!("TakeProfit({}, {}, short={})", self.column, self.value, self.short)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(1)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        let value = self.value;
        if self.short && self.reads_price_move() {
            last_matches(window, &self.column, |v| v <= -value)
        } else {
            last_matches(window, &self.column, |v| v >= value)
        }
    }
}

/// Threshold on the price move since entry: long fires at or below `value`,
/// short at or above.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingStop {
    column: ColumnKey,
    value: f64,
    short: bool,
}

impl TrailingStop {
    pub fn new(symbol: &str, value: f64) -> Self {
        Self {
            column: move_column(symbol, false),
            value,
            short: false,
        }
    }

    pub fn short(mut self) -> Self {
        self.short = true;
        self
    }

    pub fn percent(mut self) -> Self {
        if let ColumnKey::Metric { metric, .. } = &mut self.column {
            *metric = Metric::PlPercent;
        }
        self
    }
}

impl Criterion for TrailingStop {
    fn name(&self) -> String {
        format!("TrailingStop({}, {}, short={})", self.column, self.value, self.short)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(1)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        let value = self.value;
        if self.short {
            last_matches(window, &self.column, |v| v >= value)
        } else {
            last_matches(window, &self.column, |v| v <= value)
        }
    }
}
