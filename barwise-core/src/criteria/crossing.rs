//! CrossingAbove / CrossingBelow — strict ordering flip between the previous
//! and the latest bar.

use super::{Criterion, Operand};
use crate::table::{ColumnKey, TableWindow};

/// `(previous_a, previous_b, latest_a, latest_b)` or `None` when any is missing.
fn last_two(column: &ColumnKey, other: &Operand, window: &TableWindow<'_>) -> Option<(f64, f64, f64, f64)> {
    Some((
        window.back(column, 2)?,
        other.back(window, 2)?,
        window.back(column, 1)?,
        other.back(window, 1)?,
    ))
}

/// A was at or below B, and is now strictly above.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingAbove {
    column: ColumnKey,
    other: Operand,
}

impl CrossingAbove {
    pub fn new(column: ColumnKey, other: impl Into<Operand>) -> Self {
        Self {
            column,
            other: other.into(),
        }
    }
}

impl Criterion for CrossingAbove {
    fn name(&self) -> String {
        format!("CrossingAbove({}, {})", self.column, self.other)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(2)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        last_two(&self.column, &self.other, window)
            .is_some_and(|(a_prev, b_prev, a_now, b_now)| a_prev <= b_prev && a_now > b_now)
    }
}

/// A was at or above B, and is now strictly below.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingBelow {
    column: ColumnKey,
    other: Operand,
}

impl CrossingBelow {
    pub fn new(column: ColumnKey, other: impl Into<Operand>) -> Self {
        Self {
            column,
            other: other.into(),
        }
    }
}

impl Criterion for CrossingBelow {
    fn name(&self) -> String {
        format!("CrossingBelow({}, {})", self.column, self.other)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(2)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        last_two(&self.column, &self.other, window)
            .is_some_and(|(a_prev, b_prev, a_now, b_now)| a_prev >= b_prev && a_now < b_now)
    }
}
