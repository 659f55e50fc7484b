//! Engine configuration and per-bar result types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Action, Trade};
use crate::engine::ledger::LedgerError;
use crate::metrics::SharpeConfig;
use crate::table::PriceField;

/// When a resolved action is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTiming {
    /// Decided from bar N's close, filled at bar N+1's open.
    #[default]
    NextBarOpen,
    /// Decided and filled at bar N's close (market-on-close).
    CloseOnSignal,
}

impl ExecutionTiming {
    /// Price column fills are taken from.
    pub fn fill_field(self) -> PriceField {
        match self {
            ExecutionTiming::NextBarOpen => PriceField::Open,
            ExecutionTiming::CloseOnSignal => PriceField::Close,
        }
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub timing: ExecutionTiming,
    #[serde(default)]
    pub sharpe: SharpeConfig,
}

/// What happened on one processed bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarOutcome {
    pub row: usize,
    pub timestamp: Option<NaiveDateTime>,
    /// Trades the ledger recorded on this bar.
    pub fills: Vec<Trade>,
    /// Recoverable ledger conditions raised on this bar.
    pub errors: Vec<LedgerError>,
    /// Resolved action per symbol from this bar's criteria.
    pub decisions: BTreeMap<String, Action>,
}

/// Read-only projection of a queued action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAction {
    pub symbol: String,
    pub action: Action,
    /// Latest known open.
    pub price: f64,
    pub shares: f64,
    pub money: f64,
    pub fee: f64,
    pub slippage: f64,
}
