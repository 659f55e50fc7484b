//! Calendar criteria over the table's datetime index.
//!
//! Each exposes a per-row `series`; the engine only consults the last
//! element, which is what `apply` returns.

use chrono::{Datelike, NaiveDateTime};

use super::Criterion;
use crate::table::TableWindow;

macro_rules! calendar {
    ($(#[$doc:meta])* $name:ident, $field:ident, $ty:ty, $extract:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            $field: $ty,
        }

        impl $name {
            pub fn new($field: $ty) -> Self {
                Self { $field }
            }

            /// Per-row result over the window's index.
            pub fn series(&self, window: &TableWindow<'_>) -> Vec<bool> {
                let extract: fn(&NaiveDateTime) -> $ty = $extract;
                window
                    .index()
                    .iter()
                    .map(|ts| extract(ts) == self.$field)
                    .collect()
            }
        }

        impl Criterion for $name {
            fn name(&self) -> String {
                format!(concat!(stringify!($name), "({})"), self.$field)
            }

            fn required_bars(&self) -> Option<usize> {
                Some(1)
            }

            fn apply(&self, window: &TableWindow<'_>) -> bool {
                let extract: fn(&NaiveDateTime) -> $ty = $extract;
                window
                    .index()
                    .last()
                    .is_some_and(|ts| extract(ts) == self.$field)
            }
        }
    };
}

calendar!(
    /// Calendar year of the bar.
    IsYear, year, i32, |ts| ts.year()
);
calendar!(
    /// Month of the bar, 1 (January) to 12 (December).
    IsMonth, month, u32, |ts| ts.month()
);
calendar!(
    /// Day of month, 1 to 31.
    IsDay, day, u32, |ts| ts.day()
);
calendar!(
    /// Weekday, 0 (Monday) to 6 (Sunday).
    IsWeekday, weekday, u32, |ts| ts.weekday().num_days_from_monday()
);

#[cfg(test)]
mod tests {
    use super::super::test_support::table_with;
    use super::*;
    use crate::table::{BarTable, ColumnKey};

    #[test]
    fn calendar_components_of_last_bar() {
        // 2010-06-01 .. 2010-06-03: Tuesday .. Thursday
        let table = table_with(&ColumnKey::close("MSFT"), &[1.0, 2.0, 3.0]);
        assert!(IsYear::new(2010).evaluate(&table));
        assert!(IsMonth::new(6).evaluate(&table));
        assert!(IsDay::new(3).evaluate(&table));
        assert!(!IsDay::new(1).evaluate(&table));
        assert!(IsWeekday::new(3).evaluate(&table));
    }

    #[test]
    fn series_covers_every_row() {
        let table = table_with(&ColumnKey::close("MSFT"), &[1.0, 2.0, 3.0]);
        let series = IsWeekday::new(1).series(&table.window(None));
        assert_eq!(series, vec![true, false, false]);
    }

    #[test]
    fn empty_table_is_false() {
        assert!(!IsYear::new(2010).apply(&BarTable::new().window(None)));
    }
}
