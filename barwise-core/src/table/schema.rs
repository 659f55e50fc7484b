//! Column schema — typed column keys and the external naming convention.
//!
//! Internally every column is addressed by a [`ColumnKey`]. The string forms
//! (`MSFT_Close`, `ACTIONS_MSFT`, `PL_VALUE_MSFT`, ...) exist only at the
//! boundary: `Display` renders them, `FromStr` parses them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::{BarTable, ColumnId};

/// Raw price/volume fields supplied by the data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
    AdjClose,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
        PriceField::AdjClose,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
            PriceField::Volume => "Volume",
            PriceField::AdjClose => "Adj Close",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Open" => Some(PriceField::Open),
            "High" => Some(PriceField::High),
            "Low" => Some(PriceField::Low),
            "Close" => Some(PriceField::Close),
            "Volume" => Some(PriceField::Volume),
            "Adj Close" | "AdjClose" => Some(PriceField::AdjClose),
            _ => None,
        }
    }
}

/// Derived per-symbol columns written by the engine and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Action code executed on the bar.
    Actions,
    /// Signed position run-length: >0 long, <0 short, 0 flat.
    Status,
    /// Profit/loss in currency.
    Pl,
    /// Price delta since entry.
    PlValue,
    /// Fractional price change since entry.
    PlPercent,
}

impl Metric {
    pub fn prefix(self) -> &'static str {
        match self {
            Metric::Actions => "ACTIONS",
            Metric::Status => "STATUS",
            Metric::Pl => "PL",
            Metric::PlValue => "PL_VALUE",
            Metric::PlPercent => "PL_PERCENT",
        }
    }
}

/// Typed address of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    Price { symbol: String, field: PriceField },
    Metric { metric: Metric, symbol: String },
    /// Indicator or any other externally named column.
    Custom(String),
}

impl ColumnKey {
    pub fn price(symbol: &str, field: PriceField) -> Self {
        ColumnKey::Price {
            symbol: symbol.to_string(),
            field,
        }
    }

    pub fn open(symbol: &str) -> Self {
        Self::price(symbol, PriceField::Open)
    }

    pub fn close(symbol: &str) -> Self {
        Self::price(symbol, PriceField::Close)
    }

    pub fn metric(metric: Metric, symbol: &str) -> Self {
        ColumnKey::Metric {
            metric,
            symbol: symbol.to_string(),
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        ColumnKey::Custom(name.into())
    }

    pub fn is_metric(&self) -> bool {
        matches!(self, ColumnKey::Metric { .. })
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Price { symbol, field } => write!(f, "{symbol}_{}", field.suffix()),
            ColumnKey::Metric { metric, symbol } => write!(f, "{}_{symbol}", metric.prefix()),
            ColumnKey::Custom(name) => f.write_str(name),
        }
    }
}

impl FromStr for ColumnKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Longest prefixes first: PL_VALUE_ and PL_PERCENT_ before PL_.
        const METRICS: [Metric; 5] = [
            Metric::PlValue,
            Metric::PlPercent,
            Metric::Actions,
            Metric::Status,
            Metric::Pl,
        ];
        for metric in METRICS {
            let symbol = s
                .strip_prefix(metric.prefix())
                .and_then(|rest| rest.strip_prefix('_'));
            if let Some(symbol) = symbol.filter(|sym| !sym.is_empty()) {
                return Ok(ColumnKey::metric(metric, symbol));
            }
        }
        if let Some((symbol, suffix)) = s.rsplit_once('_') {
            if let Some(field) = PriceField::from_suffix(suffix).filter(|_| !symbol.is_empty()) {
                return Ok(ColumnKey::price(symbol, field));
            }
        }
        Ok(ColumnKey::Custom(s.to_string()))
    }
}

impl From<&str> for ColumnKey {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        }
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColumnKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ColumnKey::from(raw.as_str()))
    }
}

/// Column ids for one symbol, resolved once per run.
///
/// The bar loop touches these columns on every bar; resolving them up front
/// keeps key hashing out of the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolColumns {
    pub open: ColumnId,
    pub close: ColumnId,
    pub actions: ColumnId,
    pub status: ColumnId,
    pub pl: ColumnId,
    pub pl_value: ColumnId,
    pub pl_percent: ColumnId,
}

impl SymbolColumns {
    /// Resolve (and create where needed) the columns for `symbol`.
    ///
    /// Open and Close are created NaN-filled when the symbol has no data yet;
    /// `ACTIONS`/`STATUS` zero-filled (NO_ACTION, flat); the P&L columns
    /// NaN-filled.
    pub fn resolve(table: &mut BarTable, symbol: &str) -> Self {
        Self {
            open: table.ensure_column(&ColumnKey::open(symbol), f64::NAN),
            close: table.ensure_column(&ColumnKey::close(symbol), f64::NAN),
            actions: table.ensure_column(&ColumnKey::metric(Metric::Actions, symbol), 0.0),
            status: table.ensure_column(&ColumnKey::metric(Metric::Status, symbol), 0.0),
            pl: table.ensure_column(&ColumnKey::metric(Metric::Pl, symbol), f64::NAN),
            pl_value: table.ensure_column(&ColumnKey::metric(Metric::PlValue, symbol), f64::NAN),
            pl_percent: table
                .ensure_column(&ColumnKey::metric(Metric::PlPercent, symbol), f64::NAN),
        }
    }

    /// Column holding the fill price for `field` (Open or Close).
    pub fn price(&self, field: PriceField) -> ColumnId {
        match field {
            PriceField::Close => self.close,
            _ => self.open,
        }
    }
}
