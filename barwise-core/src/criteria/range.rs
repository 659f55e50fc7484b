//! InRange — latest value within `[min, max]`, bounds inclusive.

use super::{Criterion, Operand};
use crate::table::{ColumnKey, TableWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct InRange {
    column: ColumnKey,
    min: Operand,
    max: Operand,
}

impl InRange {
    pub fn new(column: ColumnKey, min: impl Into<Operand>, max: impl Into<Operand>) -> Self {
        Self {
            column,
            min: min.into(),
            max: max.into(),
        }
    }
}

impl Criterion for InRange {
    fn name(&self) -> String {
        format!("InRange({}, {}, {})", self.column, self.min, self.max)
    }

    fn required_bars(&self) -> Option<usize> {
        Some(1)
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        let (Some(value), Some(min), Some(max)) = (
            window.last(&self.column),
            self.min.back(window, 1),
            self.max.back(window, 1),
        ) else {
            return false;
        };
        value >= min && value <= max
    }
}
