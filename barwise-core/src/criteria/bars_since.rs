//! BarsSinceAction — inspects the trailing `ACTIONS_<symbol>` history.

use serde::{Deserialize, Serialize};

use super::Criterion;
use crate::domain::Action;
use crate::table::{ColumnKey, Metric, TableWindow};

/// How `periods` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinceCondition {
    /// The action occurred exactly `periods` bars ago.
    #[default]
    #[serde(alias = "EXACTLY")]
    Exactly,
    /// The action has not occurred in the last `periods + 1` bars.
    #[serde(alias = "OVER")]
    Over,
    /// The action occurred within the last `periods` bars.
    #[serde(alias = "UNDER")]
    Under,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsSinceAction {
    actions: ColumnKey,
    action: Action,
    periods: usize,
    condition: SinceCondition,
}

/// Same criterion under the name older strategy definitions use.
pub type TimeSinceAction = BarsSinceAction;

impl BarsSinceAction {
    pub fn new(symbol: &str, action: Action, periods: usize) -> Self {
        Self {
            actions: ColumnKey::metric(Metric::Actions, symbol),
            action,
            periods,
            condition: SinceCondition::Exactly,
        }
    }

    pub fn long(symbol: &str, periods: usize) -> Self {
        Self::new(symbol, Action::Long, periods)
    }

    pub fn short(symbol: &str, periods: usize) -> Self {
        Self::new(symbol, Action::Short, periods)
    }

    pub fn long_exit(symbol: &str, periods: usize) -> Self {
        Self::new(symbol, Action::LongExit, periods)
    }

    pub fn short_exit(symbol: &str, periods: usize) -> Self {
        Self::new(symbol, Action::ShortExit, periods)
    }

    pub fn condition(mut self, condition: SinceCondition) -> Self {
        self.condition = condition;
        self
    }

    fn occurs_in(&self, cells: &[f64]) -> bool {
        cells
            .iter()
            .any(|&cell| Action::from_cell(cell) == Some(self.action))
    }
}

impl Criterion for BarsSinceAction {
    fn name(&self) -> String {
        format!(
            "BarsSinceAction({}, {}, {}, {:?})",
            self.actions, self.action, self.periods, self.condition
        )
    }

    fn required_bars(&self) -> Option<usize> {
        match self.condition {
            SinceCondition::Under => Some(self.periods.max(1)),
            SinceCondition::Exactly | SinceCondition::Over => Some(self.periods + 1),
        }
    }

    fn apply(&self, window: &TableWindow<'_>) -> bool {
        let Some(cells) = window.column(&self.actions) else {
            return false;
        };
        match self.condition {
            SinceCondition::Exactly => cells
                .len()
                .checked_sub(self.periods + 1)
                .and_then(|i| Action::from_cell(cells[i]))
                .is_some_and(|action| action == self.action),
            SinceCondition::Over => {
                let Some(start) = cells.len().checked_sub(self.periods + 1) else {
                    return false;
                };
                !self.occurs_in(&cells[start..])
            }
            SinceCondition::Under => {
                if self.periods < 1 {
                    return false;
                }
                let Some(start) = cells.len().checked_sub(self.periods) else {
                    return false;
                };
                self.occurs_in(&cells[start..])
            }
        }
    }
}
