//! Above / Below / Equals — compare a column `lookback` bars back against a
//! literal or another column at the same offset.

use super::{Criterion, Operand};
use crate::table::{ColumnKey, TableWindow};

macro_rules! comparison {
    ($(#[$doc:meta])* $name:ident, $label:literal, $op:tt) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            column: ColumnKey,
            other: Operand,
            lookback: usize,
        }

        impl $name {
            pub fn new(column: ColumnKey, other: impl Into<Operand>) -> Self {
                Self {
                    column,
                    other: other.into(),
                    lookback: 1,
                }
            }

            /// Compare the value `lookback` bars back (1 = latest). Clamped to >= 1.
            pub fn lookback(mut self, lookback: usize) -> Self {
                self.lookback = lookback.max(1);
                self
            }
        }

        impl Criterion for $name {
            fn name(&self) -> String {
                format!(concat!($label, "({}, {}, lookback={})"), self.column, self.other, self.lookback)
            }

            fn required_bars(&self) -> Option<usize> {
                Some(self.lookback)
            }

            fn apply(&self, window: &TableWindow<'_>) -> bool {
                let lhs = window.back(&self.column, self.lookback);
                let rhs = self.other.back(window, self.lookback);
                match (lhs, rhs) {
                    (Some(a), Some(b)) => a $op b,
                    _ => false,
                }
            }
        }
    };
}

comparison!(
    /// Column strictly above the operand.
    Above, "Above", >
);
comparison!(
    /// Column strictly below the operand.
    Below, "Below", <
);
comparison!(
    /// Column exactly equal to the operand.
    Equals, "Equals", ==
);
