//! Barwise Core — criteria, criteria groups, ledger, and the bar-by-bar strategy engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (actions, bars, trades)
//! - The accumulated bar table with its typed column registry
//! - Criteria (boolean predicates over the table) and criteria groups
//! - Trading profiles: position sizing and fee models
//! - The ledger, which books trades and derives the report overview
//! - The strategy engine, which drives everything one bar at a time
//! - Reference causal indicators

pub mod criteria;
pub mod domain;
pub mod engine;
pub mod group;
pub mod indicators;
pub mod metrics;
pub mod profile;
pub mod report;
pub mod table;

pub use criteria::Criterion;
pub use domain::{Action, Bar, PositionSide, Trade};
pub use engine::{EngineConfig, EngineError, ExecutionTiming, Ledger, LedgerError, Strategy};
pub use group::{CriteriaGroup, StrategyError};
pub use indicators::Indicator;
pub use metrics::{Benchmark, SharpeConfig};
pub use profile::{TradingAmount, TradingFee, TradingProfile};
pub use report::ReportOverview;
pub use table::{BarTable, ColumnKey, PriceField};
