//! Indicators — causal column generators over the bar table.
//!
//! An indicator reads one or more existing columns and writes one derived
//! column under a deterministic name (e.g. `SMA_MSFT_Close_20`). Criteria only
//! see the output by column name.
//!
//! # Look-ahead contamination guard
//! No output value at row t may depend on data from row t+1 or later. Every
//! indicator must pass the truncated-vs-full table test.

pub mod shift;
pub mod sma;

pub use shift::Shift;
pub use sma::Sma;

use crate::table::{BarTable, ColumnId, ColumnKey, TableError};

pub trait Indicator: Send + Sync + std::fmt::Debug {
    /// Human-readable name (e.g. "sma_20").
    fn name(&self) -> &str;

    /// Key of the column this indicator writes.
    fn output(&self) -> ColumnKey;

    /// Compute over the whole table and insert (or replace) the output column.
    ///
    /// Warmup rows are NaN. Fails with [`TableError::UnknownColumn`] when the
    /// input column is absent.
    fn compute(&self, table: &mut BarTable) -> Result<ColumnId, TableError>;
}

/// Input column values, or `UnknownColumn`.
pub(crate) fn input<'t>(table: &'t BarTable, key: &ColumnKey) -> Result<&'t [f64], TableError> {
    table
        .column(key)
        .ok_or_else(|| TableError::UnknownColumn(key.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::table::{BarTable, ColumnKey};
    use chrono::NaiveDate;

    /// Table with one `TEST_Close` column on consecutive days.
    pub fn close_table(closes: &[f64]) -> BarTable {
        let key = ColumnKey::close("TEST");
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut table = BarTable::new();
        for (i, &close) in closes.iter().enumerate() {
            table
                .append_row(base + chrono::Duration::days(i as i64), [(&key, close)])
                .unwrap();
        }
        table
    }

    /// Assert two f64 values are approximately equal (within epsilon).
    pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
        assert!(
            (actual - expected).abs() < epsilon,
            "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
            (actual - expected).abs()
        );
    }

    pub const DEFAULT_EPSILON: f64 = 1e-10;
}
