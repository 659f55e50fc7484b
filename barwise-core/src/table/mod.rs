//! Bar table — time-indexed columnar store shared by data, indicators,
//! criteria and the ledger.
//!
//! Rows are ordered by timestamp. Columns are `f64` series addressed by
//! [`ColumnKey`] at the boundary and by [`ColumnId`] in the bar loop. NaN
//! marks a missing cell.

pub mod schema;

pub use schema::{ColumnKey, Metric, PriceField, SymbolColumns};

use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

/// Dense index of a column inside one [`BarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(usize);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("row timestamp {timestamp} is not after the last row ({last})")]
    OutOfOrder {
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    },

    #[error("column '{column}' has {got} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("missing price column '{0}'")]
    MissingColumn(String),
}

/// Ordered, append-only (for the engine) columnar table.
#[derive(Debug, Clone, Default)]
pub struct BarTable {
    index: Vec<NaiveDateTime>,
    keys: Vec<ColumnKey>,
    lookup: HashMap<ColumnKey, ColumnId>,
    columns: Vec<Vec<f64>>,
}

impl BarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }

    /// Column keys in insertion order.
    pub fn keys(&self) -> &[ColumnKey] {
        &self.keys
    }

    pub fn column_id(&self, key: &ColumnKey) -> Option<ColumnId> {
        self.lookup.get(key).copied()
    }

    pub fn key(&self, id: ColumnId) -> Option<&ColumnKey> {
        self.keys.get(id.0)
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&[f64]> {
        self.column_id(key).map(|id| self.values(id))
    }

    /// Values of a column. An id from another table yields an empty slice.
    pub fn values(&self, id: ColumnId) -> &[f64] {
        self.columns.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: ColumnId, row: usize) -> Option<f64> {
        self.values(id).get(row).copied()
    }

    pub fn last(&self, id: ColumnId) -> Option<f64> {
        self.values(id).last().copied()
    }

    /// Value in the row before the last one.
    pub fn previous(&self, id: ColumnId) -> Option<f64> {
        let values = self.values(id);
        values.len().checked_sub(2).and_then(|i| values.get(i).copied())
    }

    pub fn set(&mut self, id: ColumnId, row: usize, value: f64) {
        if let Some(cell) = self.columns.get_mut(id.0).and_then(|c| c.get_mut(row)) {
            *cell = value;
        }
    }

    pub fn set_last(&mut self, id: ColumnId, value: f64) {
        if let Some(cell) = self.columns.get_mut(id.0).and_then(|c| c.last_mut()) {
            *cell = value;
        }
    }

    /// Return the id for `key`, creating the column filled with `fill` if absent.
    pub fn ensure_column(&mut self, key: &ColumnKey, fill: f64) -> ColumnId {
        if let Some(id) = self.column_id(key) {
            return id;
        }
        self.push_column(key.clone(), vec![fill; self.len()])
    }

    /// Insert or replace a whole column. Used by indicators.
    pub fn insert_column(&mut self, key: ColumnKey, values: Vec<f64>) -> Result<ColumnId, TableError> {
        if values.len() != self.len() {
            return Err(TableError::LengthMismatch {
                column: key.to_string(),
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.column_id(&key) {
            Some(id) => {
                self.columns[id.0] = values;
                Ok(id)
            }
            None => Ok(self.push_column(key, values)),
        }
    }

    fn push_column(&mut self, key: ColumnKey, values: Vec<f64>) -> ColumnId {
        let id = ColumnId(self.columns.len());
        self.lookup.insert(key.clone(), id);
        self.keys.push(key);
        self.columns.push(values);
        id
    }

    /// Append a row strictly after the current last timestamp.
    ///
    /// Columns not mentioned in `cells` get NaN; unknown keys create new
    /// columns back-filled with NaN. Returns the new row index.
    pub fn append_row<'a, I>(&mut self, timestamp: NaiveDateTime, cells: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = (&'a ColumnKey, f64)>,
    {
        if let Some(last) = self.last_timestamp() {
            if timestamp <= last {
                return Err(TableError::OutOfOrder { timestamp, last });
            }
        }
        let row = self.insert_empty_row(self.len(), timestamp);
        for (key, value) in cells {
            let id = self.ensure_column(key, f64::NAN);
            self.set(id, row, value);
        }
        Ok(row)
    }

    /// Merge cells into the row at `timestamp`, creating it if needed.
    ///
    /// Combine-first: a cell that already holds a non-NaN value is never
    /// overwritten. Rows may arrive out of order here (e.g. one symbol's file
    /// after another's); they are inserted at their sorted position.
    pub fn merge_row<'a, I>(&mut self, timestamp: NaiveDateTime, cells: I) -> usize
    where
        I: IntoIterator<Item = (&'a ColumnKey, f64)>,
    {
        let row = match self.index.binary_search(&timestamp) {
            Ok(row) => row,
            Err(pos) => self.insert_empty_row(pos, timestamp),
        };
        for (key, value) in cells {
            let id = self.ensure_column(key, f64::NAN);
            if self.get(id, row).map_or(true, f64::is_nan) {
                self.set(id, row, value);
            }
        }
        row
    }

    /// Combine-first merge of every row of `other` into this table.
    pub fn merge_table(&mut self, other: &BarTable) {
        for row in 0..other.len() {
            self.merge_row(other.index[row], other.row(row));
        }
    }

    fn insert_empty_row(&mut self, pos: usize, timestamp: NaiveDateTime) -> usize {
        self.index.insert(pos, timestamp);
        for column in &mut self.columns {
            column.insert(pos, f64::NAN);
        }
        pos
    }

    /// Non-NaN cells of row `row`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (&ColumnKey, f64)> + '_ {
        self.keys
            .iter()
            .zip(&self.columns)
            .filter_map(move |(key, column)| {
                column
                    .get(row)
                    .copied()
                    .filter(|v| !v.is_nan())
                    .map(|v| (key, v))
            })
    }

    /// View of the trailing `rows` rows (`None` = full history).
    pub fn window(&self, rows: Option<usize>) -> TableWindow<'_> {
        let start = rows.map_or(0, |n| self.len().saturating_sub(n));
        TableWindow { table: self, start }
    }

    /// View of the first `rows` rows. Used to replay history without lookahead.
    pub fn head(&self, rows: usize) -> BarTable {
        let rows = rows.min(self.len());
        BarTable {
            index: self.index[..rows].to_vec(),
            keys: self.keys.clone(),
            lookup: self.lookup.clone(),
            columns: self.columns.iter().map(|c| c[..rows].to_vec()).collect(),
        }
    }
}

/// Borrowed view of the trailing rows of a [`BarTable`].
#[derive(Debug, Clone, Copy)]
pub struct TableWindow<'a> {
    table: &'a BarTable,
    start: usize,
}

impl<'a> TableWindow<'a> {
    pub fn len(&self) -> usize {
        self.table.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> &'a [NaiveDateTime] {
        &self.table.index[self.start..]
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&'a [f64]> {
        let table: &'a BarTable = self.table;
        table.column(key).map(|values| &values[self.start..])
    }

    pub fn last(&self, key: &ColumnKey) -> Option<f64> {
        self.back(key, 1)
    }

    /// Value `n` rows from the end (`n = 1` is the latest row).
    pub fn back(&self, key: &ColumnKey, n: usize) -> Option<f64> {
        let values = self.column(key)?;
        values.len().checked_sub(n).and_then(|i| values.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 6, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn append_rejects_non_increasing_timestamp() {
        let close = ColumnKey::close("MSFT");
        let mut table = BarTable::new();
        table.append_row(ts(2), [(&close, 1.0)]).unwrap();
        let err = table.append_row(ts(2), [(&close, 2.0)]).unwrap_err();
        assert!(matches!(err, TableError::OutOfOrder { .. }));
        assert!(table.append_row(ts(1), [(&close, 2.0)]).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn new_columns_are_backfilled_with_nan() {
        let close = ColumnKey::close("MSFT");
        let open = ColumnKey::open("MSFT");
        let mut table = BarTable::new();
        table.append_row(ts(1), [(&close, 1.0)]).unwrap();
        table.append_row(ts(2), [(&close, 2.0), (&open, 1.5)]).unwrap();
        let opens = table.column(&open).unwrap();
        assert!(opens[0].is_nan());
        assert_eq!(opens[1], 1.5);
    }

    #[test]
    fn merge_is_combine_first() {
        let close = ColumnKey::close("MSFT");
        let aapl = ColumnKey::close("AAPL");
        let mut table = BarTable::new();
        table.merge_row(ts(2), [(&close, 10.0)]);
        table.merge_row(ts(2), [(&close, 99.0), (&aapl, 5.0)]);
        table.merge_row(ts(1), [(&aapl, 4.0)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.index()[0], ts(1));
        assert_eq!(table.column(&close).unwrap()[1], 10.0);
        assert!(table.column(&close).unwrap()[0].is_nan());
        assert_eq!(table.column(&aapl).unwrap(), &[4.0, 5.0]);
    }

    #[test]
    fn window_views_trailing_rows() {
        let close = ColumnKey::close("MSFT");
        let mut table = BarTable::new();
        for (day, v) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            table.append_row(ts(day), [(&close, v)]).unwrap();
        }
        let window = table.window(Some(2));
        assert_eq!(window.len(), 2);
        assert_eq!(window.column(&close).unwrap(), &[2.0, 3.0]);
        assert_eq!(window.back(&close, 2), Some(2.0));
        assert_eq!(window.back(&close, 3), None);
        assert_eq!(table.window(Some(10)).len(), 3);
        assert_eq!(table.window(None).len(), 3);
        assert_eq!(window.last(&ColumnKey::close("AAPL")), None);
    }

    #[test]
    fn insert_column_checks_length() {
        let close = ColumnKey::close("MSFT");
        let mut table = BarTable::new();
        table.append_row(ts(1), [(&close, 1.0)]).unwrap();
        let err = table
            .insert_column(ColumnKey::custom("SMA"), vec![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { expected: 1, got: 2, .. }));
    }

    #[test]
    fn head_truncates_rows() {
        let close = ColumnKey::close("MSFT");
        let mut table = BarTable::new();
        for (day, v) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            table.append_row(ts(day), [(&close, v)]).unwrap();
        }
        let head = table.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.column(&close).unwrap(), &[1.0, 2.0]);
    }
}
