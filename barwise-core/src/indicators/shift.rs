//! Shift — a column lagged by a fixed number of rows.
//!
//! `SHIFT_<column>_<periods>[t] = column[t - periods]`; the first `periods`
//! rows are NaN.

use super::{input, Indicator};
use crate::table::{BarTable, ColumnId, ColumnKey, TableError};

#[derive(Debug, Clone)]
pub struct Shift {
    column: ColumnKey,
    periods: usize,
    name: String,
}

impl Shift {
    pub fn new(column: impl Into<ColumnKey>, periods: usize) -> Self {
        Self {
            column: column.into(),
            periods,
            name: format!("shift_{periods}"),
        }
    }
}

impl Indicator for Shift {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> ColumnKey {
        ColumnKey::custom(format!("SHIFT_{}_{}", self.column, self.periods))
    }

    fn compute(&self, table: &mut BarTable) -> Result<ColumnId, TableError> {
        let source = input(table, &self.column)?;
        let values: Vec<f64> = (0..source.len())
            .map(|i| i.checked_sub(self.periods).map_or(f64::NAN, |j| source[j]))
            .collect();
        table.insert_column(self.output(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::close_table;

    #[test]
    fn lags_by_periods() {
        let mut table = close_table(&[1.0, 2.0, 3.0, 4.0]);
        let shift = Shift::new("TEST_Close", 2);
        let id = shift.compute(&mut table).unwrap();
        let values = table.values(id);
        assert!(values[0].is_nan() && values[1].is_nan());
        assert_eq!(&values[2..], &[1.0, 2.0]);
        assert_eq!(table.key(id).unwrap().to_string(), "SHIFT_TEST_Close_2");
    }

    #[test]
    fn zero_shift_copies() {
        let mut table = close_table(&[1.0, 2.0]);
        let id = Shift::new("TEST_Close", 0).compute(&mut table).unwrap();
        assert_eq!(table.values(id), &[1.0, 2.0]);
    }

    #[test]
    fn recompute_replaces_column() {
        let mut table = close_table(&[1.0, 2.0, 3.0]);
        let shift = Shift::new("TEST_Close", 1);
        let first = shift.compute(&mut table).unwrap();
        let cols = table.keys().len();
        let second = shift.compute(&mut table).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.keys().len(), cols);
    }
}
