//! Barwise Runner — configuration, data loading, orchestration and export.
//!
//! This crate builds on `barwise-core` to provide:
//! - Strategy configuration from TOML or JSON, with blake3 fingerprints
//! - CSV bar loading into a `BarTable`
//! - A single-run backtest entry point
//! - CSV/JSON export of the annotated table, trades and overview

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, CriterionConfig, GroupConfig, IndicatorConfig, StrategyConfig};
pub use data_loader::{load_bars_csv, load_bars_file, load_bars_files, LoadError};
pub use export::{export_overview_json, export_table_csv, export_trades_csv, save_artifacts};
pub use runner::{run_backtest, run_backtest_from_files, BacktestResult, RunError};
