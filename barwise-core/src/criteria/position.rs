//! Position-state criteria read the latest `STATUS_<symbol>` cell.
//!
//! A missing column or empty table reads as flat.

use super::{last_matches, Criterion};
use crate::table::{ColumnKey, Metric, TableWindow};

macro_rules! position_state {
    ($(#[$doc:meta])* $name:ident, $pred:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            status: ColumnKey,
        }

        impl $name {
            pub fn new(symbol: &str) -> Self {
                Self {
                    status: ColumnKey::metric(Metric::Status, symbol),
                }
            }
        }

        impl Criterion for $name {
            fn name(&self) -> String {
                format!(concat!(stringify!($name), "({})"), self.status)
            }

            fn required_bars(&self) -> Option<usize> {
                Some(1)
            }

            fn apply(&self, window: &TableWindow<'_>) -> bool {
                last_matches(window, &self.status, $pred)
            }
        }
    };
}

position_state!(
    /// Holding any position.
    InMarket, |s| s != 0.0
);
position_state!(
    /// Holding a long position.
    IsLong, |s| s > 0.0
);
position_state!(
    /// Holding a short position.
    IsShort, |s| s < 0.0
);
