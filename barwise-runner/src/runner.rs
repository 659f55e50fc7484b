//! Backtest orchestration: config + bars in, overview + annotated table out.
//!
//! Pipeline:
//! 1. Compute the configured indicators on the source table (once, causal)
//! 2. Build criteria groups and the strategy from the config
//! 3. Replay every bar through the engine
//! 4. Collect the overview, queued actions and recoverable ledger errors

use std::path::Path;

use thiserror::Error;

use barwise_core::engine::{EngineError, LedgerError, NextAction};
use barwise_core::report::ReportOverview;
use barwise_core::table::{BarTable, TableError};

use crate::config::{ConfigError, Fingerprint, StrategyConfig};
use crate::data_loader::{load_bars_files, LoadError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("indicator error: {0}")]
    Indicator(TableError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub name: Option<String>,
    pub fingerprint: Fingerprint,
    pub overview: ReportOverview,
    /// Source columns, indicator columns and the per-symbol metric columns.
    pub table: BarTable,
    pub ledger_errors: Vec<LedgerError>,
    /// Actions decided on the last bar, not yet filled.
    pub next_actions: Vec<NextAction>,
    pub report_text: String,
}

impl BacktestResult {
    pub fn bar_count(&self) -> usize {
        self.table.len()
    }
}

/// Run one configuration over `bars`.
pub fn run_backtest(config: &StrategyConfig, mut bars: BarTable) -> Result<BacktestResult, RunError> {
    let fingerprint = config.fingerprint()?;
    tracing::info!(
        name = config.name.as_deref().unwrap_or("unnamed"),
        fingerprint = %fingerprint,
        rows = bars.len(),
        "backtest_started"
    );

    for indicator in config.build_indicators()? {
        indicator.compute(&mut bars).map_err(RunError::Indicator)?;
        tracing::debug!(indicator = indicator.name(), output = %indicator.output(), "indicator_computed");
    }

    let mut strategy = config.build()?;
    let overview = strategy.simulate(&bars)?;
    let next_actions = strategy.next_actions();
    let ledger_errors = strategy.ledger_errors().to_vec();
    let report_text = strategy.report_text();

    tracing::info!(
        fingerprint = %fingerprint,
        trades = overview.trades,
        net_profit = overview.net_profit,
        ledger_errors = ledger_errors.len(),
        "backtest_finished"
    );

    Ok(BacktestResult {
        name: config.name.clone(),
        fingerprint,
        overview,
        table: strategy.into_table(),
        ledger_errors,
        next_actions,
        report_text,
    })
}

/// Load the config and bar files from disk, then run.
pub fn run_backtest_from_files<P: AsRef<Path>>(
    config_path: &Path,
    bar_paths: &[P],
) -> Result<BacktestResult, RunError> {
    let config = StrategyConfig::from_file(config_path)?;
    let bars = load_bars_files(bar_paths)?;
    run_backtest(&config, bars)
}
