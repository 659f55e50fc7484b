//! Simple Moving Average (SMA).
//!
//! Rolling mean of one column over a lookback window, written to
//! `SMA_<column>_<period>`. First valid value at row `period - 1`; any NaN
//! inside the window yields NaN.

use super::{input, Indicator};
use crate::table::{BarTable, ColumnId, ColumnKey, TableError};

#[derive(Debug, Clone)]
pub struct Sma {
    column: ColumnKey,
    period: usize,
    name: String,
}

impl Sma {
    /// `period` is clamped to at least 1.
    pub fn new(column: impl Into<ColumnKey>, period: usize) -> Self {
        let period = period.max(1);
        Self {
            column: column.into(),
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Rolling mean of `values`; NaN until the window is full.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    let mut nans = values[..period].iter().filter(|v| v.is_nan()).count();
    if nans == 0 {
        result[period - 1] = sum / period as f64;
    }

    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        nans = nans + usize::from(entering.is_nan()) - usize::from(leaving.is_nan());
        if nans > 0 {
            continue;
        }
        if leaving.is_nan() {
            // window just became clean; the running sum is poisoned
            sum = values[(i + 1 - period)..=i].iter().sum();
        } else {
            sum = sum - leaving + entering;
        }
        result[i] = sum / period as f64;
    }

    result
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> ColumnKey {
        ColumnKey::custom(format!("SMA_{}_{}", self.column, self.period))
    }

    fn compute(&self, table: &mut BarTable) -> Result<ColumnId, TableError> {
        let values = sma_of_series(input(table, &self.column)?, self.period);
        table.insert_column(self.output(), values)
    }
}
