//! Criteria — boolean predicates over the accumulated bar table.
//!
//! A criterion sees a [`TableWindow`] holding the trailing
//! `required_bars()` rows (or the full history when `None`). It returns
//! `true` only when its condition is positively satisfied: missing columns,
//! NaN cells and short history all evaluate to `false`, so ambiguous data
//! never triggers a trade.

pub mod bars_since;
pub mod calendar;
pub mod comparison;
pub mod crossing;
pub mod exits;
pub mod position;
pub mod range;

pub use bars_since::{BarsSinceAction, SinceCondition, TimeSinceAction};
pub use calendar::{IsDay, IsMonth, IsWeekday, IsYear};
pub use comparison::{Above, Below, Equals};
pub use crossing::{CrossingAbove, CrossingBelow};
pub use exits::{StopLoss, TakeProfit, TrailingStop};
pub use position::{InMarket, IsLong, IsShort};
pub use range::InRange;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::table::{BarTable, ColumnKey, TableWindow};

/// A predicate over the latest bar (or a bounded lookback window).
///
/// Criteria are stateless apart from their parameters.
pub trait Criterion: Send + Sync + fmt::Debug {
    /// Human-readable label, e.g. `Above(MSFT_Close, 25.88)`.
    fn name(&self) -> String;

    /// Minimum trailing rows needed for a meaningful result.
    /// `None` means the full history is passed.
    fn required_bars(&self) -> Option<usize>;

    fn apply(&self, window: &TableWindow<'_>) -> bool;

    /// Slice `table` to `required_bars()` trailing rows and apply.
    ///
    /// Returns `false` when the table holds fewer rows than required.
    fn evaluate(&self, table: &BarTable) -> bool {
        let required = self.required_bars();
        let window = table.window(required);
        if required.is_some_and(|n| window.len() < n) {
            return false;
        }
        self.apply(&window)
    }
}

/// Right-hand side of a comparison: another column or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Value(f64),
    Column(ColumnKey),
}

impl Operand {
    /// Value `n` rows from the end of the window (`n = 1` is the latest).
    pub fn back(&self, window: &TableWindow<'_>, n: usize) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Column(key) => window.back(key, n),
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Value(value)
    }
}

impl From<ColumnKey> for Operand {
    fn from(key: ColumnKey) -> Self {
        Operand::Column(key)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::Column(ColumnKey::from(name))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{v}"),
            Operand::Column(key) => write!(f, "{key}"),
        }
    }
}

/// Inverse of a wrapped criterion.
///
/// Short history stays `false`: a `Not` never fires on data its inner
/// criterion could not judge.
#[derive(Debug)]
pub struct Not {
    inner: Box<dyn Criterion>,
}

impl Not {
    pub fn new(inner: impl Criterion + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn boxed(inner: Box<dyn Criterion>) -> Self {
        Self { inner }
    }
}

impl Criterion for Not {
    fn name(&self) -> String {
        format!("Not({})", self.inner.name())
    }

    fn required_bars(&self) -> Option<usize> {
        self.inner.required_bars()
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        if self.required_bars().is_some_and(|n| window.len() < n) {
            return false;
        }
        !self.inner.apply(window)
    }
}

/// Latest non-NaN value strictly satisfying `pred`.
pub(crate) fn last_matches(window: &TableWindow<'_>, key: &ColumnKey, pred: impl Fn(f64) -> bool) -> bool {
    window
        .last(key)
        .is_some_and(|v| !v.is_nan() && pred(v))
}


#[cfg(test)]
mod tests {
    use super::test_support::table_with;
    use super::*;

    #[test]
    fn not_inverts_false_only() {
        let close = ColumnKey::close("MSFT");
        let table = table_with(&close, &[10.0, 12.0]);
        assert!(Not::new(Above::new(close.clone(), 20.0)).evaluate(&table));
        assert!(!Not::new(Above::new(close.clone(), 5.0)).evaluate(&table));
    }

    #[test]
    fn not_is_false_on_short_history() {
        let close = ColumnKey::close("MSFT");
        let table = table_with(&close, &[10.0]);
        let crossing = Not::new(CrossingAbove::new(close.clone(), 11.0));
        assert!(!crossing.evaluate(&table));
        assert!(!crossing.apply(&table.window(None)));
    }

    #[test]
    fn operand_parses_columns_and_literals() {
        let value: Operand = serde_json::from_str("25.88").unwrap();
        assert_eq!(value, Operand::Value(25.88));
        let column: Operand = serde_json::from_str("\"SMA_MSFT_Close_20\"").unwrap();
        assert_eq!(column, Operand::Column(ColumnKey::custom("SMA_MSFT_Close_20")));
    }
}
