//! Strategy — the bar-by-bar simulation loop.
//!
//! Per bar, in strict order (next-bar-open timing):
//!
//! 1. Append the bar's cells to the accumulated table.
//! 2. Write the action queued on the previous bar into `ACTIONS_<symbol>`.
//! 3. Update `STATUS_<symbol>` from that action.
//! 4. Ledger: preprocess P&L columns, then execute the action at the open.
//! 5. Evaluate every criteria group against history up to this close.
//! 6. Resolve per-symbol conflicts and queue the result for the next bar.
//!
//! Close-on-signal timing evaluates first and fills the resolved action at
//! the same bar's close instead of queuing it.
//!
//! A symbol with no data on a bar (NaN Open/Close) is simply idle on that
//! bar. An action whose fill price is missing is not recorded and is retried
//! on the next bar.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::ledger::{Ledger, LedgerError};
use super::resolve::{next_status, resolve_action};
use super::state::{BarOutcome, EngineConfig, ExecutionTiming, NextAction};
use super::EngineError;
use crate::domain::{Action, Trade};
use crate::group::CriteriaGroup;
use crate::metrics::SharpeConfig;
use crate::profile::TradingProfile;
use crate::report::ReportOverview;
use crate::table::{BarTable, ColumnKey, SymbolColumns, TableError};

#[derive(Debug)]
pub struct Strategy {
    groups: Vec<CriteriaGroup>,
    /// Distinct group symbols, in first-seen order.
    symbols: Vec<String>,
    config: EngineConfig,
    ledger: Ledger,
    table: BarTable,
    columns: Vec<Option<SymbolColumns>>,
    upcoming: BTreeMap<String, Action>,
    errors: Vec<LedgerError>,
}

impl Strategy {
    pub fn new(groups: Vec<CriteriaGroup>, profile: TradingProfile) -> Self {
        let mut symbols: Vec<String> = Vec::new();
        for group in &groups {
            if !symbols.iter().any(|s| s == group.symbol()) {
                symbols.push(group.symbol().to_string());
            }
        }
        tracing::info!(
            groups = groups.len(),
            symbols = symbols.len(),
            capital = profile.capital(),
            "strategy_created"
        );
        let config = EngineConfig::default();
        let columns = vec![None; symbols.len()];
        Self {
            groups,
            symbols,
            ledger: Ledger::new(profile, config.sharpe.clone()),
            config,
            table: BarTable::new(),
            columns,
            upcoming: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.ledger = Ledger::new(self.ledger.profile().clone(), config.sharpe.clone());
        self.config = config;
        self
    }

    pub fn with_timing(self, timing: ExecutionTiming) -> Self {
        let config = EngineConfig {
            timing,
            ..self.config.clone()
        };
        self.with_config(config)
    }

    pub fn with_sharpe(self, sharpe: SharpeConfig) -> Self {
        let config = EngineConfig {
            sharpe,
            ..self.config.clone()
        };
        self.with_config(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn groups(&self) -> &[CriteriaGroup] {
        &self.groups
    }

    /// The accumulated table, including derived columns.
    pub fn table(&self) -> &BarTable {
        &self.table
    }

    pub fn into_table(self) -> BarTable {
        self.table
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Every recoverable ledger error seen since the last reset.
    pub fn ledger_errors(&self) -> &[LedgerError] {
        &self.errors
    }

    /// Drop all accumulated state; configuration and groups stay.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.table = BarTable::new();
        self.columns = vec![None; self.symbols.len()];
        self.upcoming.clear();
        self.errors.clear();
    }

    /// Replay every row of `source` from a fresh state.
    ///
    /// Every tracked symbol needs Open and Close columns in `source`; a
    /// symbol whose data starts later than the others is fine.
    pub fn simulate(&mut self, source: &BarTable) -> Result<ReportOverview, EngineError> {
        tracing::info!(rows = source.len(), timing = ?self.config.timing, "simulation_started");
        self.reset();
        for symbol in &self.symbols {
            for key in [ColumnKey::open(symbol), ColumnKey::close(symbol)] {
                if source.column_id(&key).is_none() {
                    return Err(TableError::MissingColumn(key.to_string()).into());
                }
            }
        }
        for (row, &timestamp) in source.index().iter().enumerate() {
            self.process_bar(timestamp, source.row(row))?;
        }
        let report = self.report();
        tracing::info!(
            trades = report.trades,
            net_profit = report.net_profit,
            lacking_capital = report.lacking_capital,
            "simulation_finished"
        );
        Ok(report)
    }

    /// Process one new bar to completion.
    ///
    /// Ledger errors are collected (see [`Strategy::ledger_errors`]) and
    /// returned in the outcome; they never abort the run. The only failure is
    /// a `timestamp` not after the previous bar, which leaves the state
    /// untouched.
    pub fn process_bar<'a, I>(&mut self, timestamp: NaiveDateTime, cells: I) -> Result<BarOutcome, EngineError>
    where
        I: IntoIterator<Item = (&'a ColumnKey, f64)>,
    {
        let row = self.table.append_row(timestamp, cells)?;
        self.resolve_columns();
        let mut outcome = BarOutcome {
            row,
            timestamp: Some(timestamp),
            ..BarOutcome::default()
        };

        match self.config.timing {
            ExecutionTiming::NextBarOpen => {
                let mut retries = Vec::new();
                for i in 0..self.symbols.len() {
                    let action = self
                        .upcoming
                        .remove(&self.symbols[i])
                        .unwrap_or(Action::NoAction);
                    self.write_action(i, action);
                    self.preprocess(i);
                    if let Some(retry) = self.execute(i, &mut outcome) {
                        retries.push((self.symbols[i].clone(), retry));
                    }
                }
                outcome.decisions = self.decide();
                self.upcoming = outcome
                    .decisions
                    .iter()
                    .filter(|(_, a)| **a != Action::NoAction)
                    .map(|(s, a)| (s.clone(), *a))
                    .collect();
                for (symbol, action) in retries {
                    self.upcoming.entry(symbol).or_insert(action);
                }
            }
            ExecutionTiming::CloseOnSignal => {
                for i in 0..self.symbols.len() {
                    self.write_action(i, Action::NoAction);
                    self.preprocess(i);
                }
                outcome.decisions = self.decide();
                for i in 0..self.symbols.len() {
                    let symbol = &self.symbols[i];
                    let retry = self.upcoming.remove(symbol);
                    let action = match outcome.decisions.get(symbol).copied().unwrap_or_default() {
                        Action::NoAction => retry.unwrap_or_default(),
                        decided => decided,
                    };
                    self.write_action(i, action);
                    if let Some(retry) = self.execute(i, &mut outcome) {
                        self.upcoming.insert(self.symbols[i].clone(), retry);
                    }
                }
            }
        }

        self.errors.extend(outcome.errors.iter().cloned());
        tracing::debug!(row, %timestamp, fills = outcome.fills.len(), "bar_processed");
        Ok(outcome)
    }

    /// Resolve column ids on the first bar.
    fn resolve_columns(&mut self) {
        for (slot, symbol) in self.columns.iter_mut().zip(&self.symbols) {
            if slot.is_none() {
                *slot = Some(SymbolColumns::resolve(&mut self.table, symbol));
            }
        }
    }

    fn cols(&self, i: usize) -> Option<SymbolColumns> {
        self.columns.get(i).copied().flatten()
    }

    /// Write `action` and the resulting status into the latest row.
    fn write_action(&mut self, i: usize, action: Action) {
        let Some(cols) = self.cols(i) else { return };
        let previous = self.table.previous(cols.status);
        self.table.set_last(cols.actions, action.as_cell());
        self.table.set_last(cols.status, next_status(previous, action));
    }

    fn preprocess(&mut self, i: usize) {
        let Some(cols) = self.cols(i) else { return };
        let fill = self.config.timing.fill_field();
        self.ledger
            .add_preprocess_metrics(&self.symbols[i], &cols, &mut self.table, fill);
    }

    /// Execute the latest action. Returns the action to retry when the bar
    /// had no fill price; its cells are then rewritten as NO_ACTION.
    fn execute(&mut self, i: usize, outcome: &mut BarOutcome) -> Option<Action> {
        let cols = self.cols(i)?;
        let fill = self.config.timing.fill_field();
        match self
            .ledger
            .handle_action(&self.symbols[i], &cols, &self.table, fill)
        {
            Ok(Some(trade)) => outcome.fills.push(trade),
            Ok(None) => {}
            Err(err) => {
                let retry = match &err {
                    LedgerError::MissingPrice { action, .. } => Some(*action),
                    _ => None,
                };
                outcome.errors.push(err);
                if retry.is_some() {
                    self.write_action(i, Action::NoAction);
                }
                return retry;
            }
        }
        None
    }

    /// Evaluate every group and resolve one action per symbol.
    fn decide(&mut self) -> BTreeMap<String, Action> {
        let mut results: BTreeMap<&str, Vec<Action>> = BTreeMap::new();
        for group in &self.groups {
            let action = group.get_result(&mut self.table);
            results.entry(group.symbol()).or_default().push(action);
        }
        results
            .into_iter()
            .map(|(symbol, actions)| {
                let action = resolve_action(&actions);
                if action != Action::NoAction {
                    tracing::debug!(symbol, %action, "action_resolved");
                }
                (symbol.to_string(), action)
            })
            .collect()
    }

    /// Queued actions with size estimates at the latest open and current
    /// cash. Does not mutate state.
    ///
    /// Close-on-signal runs only queue actions waiting for a fill price, so
    /// entries are normally `NO_ACTION` there.
    pub fn next_actions(&self) -> Vec<NextAction> {
        let profile = self.ledger.profile();
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let action = self.upcoming.get(symbol).copied().unwrap_or_default();
                let price = self
                    .cols(i)
                    .and_then(|cols| self.table.last(cols.open))
                    .unwrap_or(f64::NAN);
                let shares = match action {
                    Action::Long | Action::Short => {
                        profile.shares(price, self.ledger.available_money())
                    }
                    Action::LongExit | Action::ShortExit => self
                        .ledger
                        .open_trade(symbol)
                        .map_or(0.0, |t: &Trade| t.shares),
                    Action::NoAction => 0.0,
                };
                let money = price * shares;
                NextAction {
                    symbol: symbol.clone(),
                    action,
                    price,
                    shares,
                    money,
                    fee: if shares > 0.0 { profile.fee_for(price, shares) } else { 0.0 },
                    slippage: profile.slippage_for(money),
                }
            })
            .collect()
    }

    pub fn report(&mut self) -> ReportOverview {
        let index = self.table.index().to_vec();
        self.ledger.overview(&index)
    }

    pub fn report_text(&mut self) -> String {
        self.report().to_string()
    }
}
