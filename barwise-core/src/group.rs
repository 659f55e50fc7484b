//! Criteria groups — criteria bound to one action on one symbol.
//!
//! Every group carries a position guard appended by [`with_position_guard`]:
//! entries require a flat position, `LONG_EXIT` requires a long one and
//! `SHORT_EXIT` a short one. The guard is part of the group's contract, so
//! construction always adds it.

use thiserror::Error;

use crate::criteria::{Criterion, InMarket, IsLong, IsShort, Not};
use crate::domain::Action;
use crate::table::{BarTable, ColumnKey, Metric};

/// Configuration errors raised while assembling a strategy. Fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("criteria group for {symbol} cannot be bound to {action}")]
    InvalidAction { symbol: String, action: Action },

    #[error("criteria group has an empty symbol")]
    EmptySymbol,
}

/// Guard criterion implied by `action` on `symbol`.
pub fn position_guard(action: Action, symbol: &str) -> Option<Box<dyn Criterion>> {
    match action {
        Action::Long | Action::Short => Some(Box::new(Not::new(InMarket::new(symbol)))),
        Action::LongExit => Some(Box::new(IsLong::new(symbol))),
        Action::ShortExit => Some(Box::new(IsShort::new(symbol))),
        Action::NoAction => None,
    }
}

/// Append the position guard for `action` to `criteria`.
pub fn with_position_guard(
    mut criteria: Vec<Box<dyn Criterion>>,
    action: Action,
    symbol: &str,
) -> Result<Vec<Box<dyn Criterion>>, StrategyError> {
    let guard = position_guard(action, symbol).ok_or_else(|| StrategyError::InvalidAction {
        symbol: symbol.to_string(),
        action,
    })?;
    criteria.push(guard);
    Ok(criteria)
}

#[derive(Debug)]
pub struct CriteriaGroup {
    criteria: Vec<Box<dyn Criterion>>,
    action: Action,
    symbol: String,
}

impl CriteriaGroup {
    pub fn new(
        criteria: Vec<Box<dyn Criterion>>,
        action: Action,
        symbol: impl Into<String>,
    ) -> Result<Self, StrategyError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(StrategyError::EmptySymbol);
        }
        let criteria = with_position_guard(criteria, action, &symbol)?;
        tracing::info!(
            symbol = %symbol,
            action = %action,
            criteria = criteria.len(),
            "criteria_group_created"
        );
        Ok(Self {
            criteria,
            action,
            symbol,
        })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Criteria including the trailing position guard.
    pub fn criteria(&self) -> &[Box<dyn Criterion>] {
        &self.criteria
    }

    /// Ensure the symbol's `ACTIONS`/`STATUS` columns exist, then evaluate.
    pub fn get_result(&self, table: &mut BarTable) -> Action {
        table.ensure_column(&ColumnKey::metric(Metric::Actions, &self.symbol), 0.0);
        table.ensure_column(&ColumnKey::metric(Metric::Status, &self.symbol), 0.0);
        self.evaluate(table)
    }

    /// The bound action if every criterion holds, otherwise `NO_ACTION`.
    pub fn evaluate(&self, table: &BarTable) -> Action {
        for criterion in &self.criteria {
            if !criterion.evaluate(table) {
                tracing::trace!(
                    symbol = %self.symbol,
                    action = %self.action,
                    criterion = %criterion.name(),
                    "criterion_false"
                );
                return Action::NoAction;
            }
        }
        tracing::debug!(symbol = %self.symbol, action = %self.action, "criteria_group_satisfied");
        self.action
    }
}
