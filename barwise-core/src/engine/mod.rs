//! Simulation engine — ledger, conflict resolution, and the bar loop.
//!
//! The engine consumes one bar at a time, appending it to the accumulated
//! table, then for every tracked symbol:
//!
//! 1. Write the pending action and update position status
//! 2. Preprocess P&L columns for the bar
//! 3. Execute the action against the ledger
//! 4. Evaluate criteria groups and queue the resolved action

pub mod ledger;
pub mod resolve;
pub mod state;
pub mod strategy;

use thiserror::Error;

use crate::group::StrategyError;
use crate::table::TableError;

pub use ledger::{BarMetrics, Ledger, LedgerError};
pub use resolve::{next_status, resolve_action, status_delta};
pub use state::{BarOutcome, EngineConfig, ExecutionTiming, NextAction};
pub use strategy::Strategy;

/// Fatal bar-loop failures. Ledger conditions are never fatal; they are
/// collected in [`BarOutcome::errors`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}
