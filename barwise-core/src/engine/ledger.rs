//! Ledger — cash, open trades, realized P&L and running statistics.
//!
//! Per symbol the ledger walks `FLAT -> LONG | SHORT -> FLAT`; there is at
//! most one open trade per symbol and no averaging into positions.
//!
//! Cash accounting keeps `available_money == capital` whenever every symbol
//! is flat: entries debit notional + fee + slippage, exits credit the entry
//! notional plus the gross move minus exit fee and slippage.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{Action, PositionSide, Trade};
use crate::metrics::{forward_fill, sharpe_ratio, SharpeConfig};
use crate::profile::TradingProfile;
use crate::report::{HistoryPoint, ReportOverview};
use crate::table::{BarTable, PriceField, SymbolColumns};

/// Recoverable, per-symbol ledger conditions. The simulation continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("{action} for {symbol} at {timestamp} has no matching open trade")]
    InvalidExit {
        symbol: String,
        timestamp: NaiveDateTime,
        action: Action,
    },

    #[error("{action} for {symbol} at {timestamp} skipped: needs {required:.2}, {available:.2} available")]
    InsufficientCapital {
        symbol: String,
        timestamp: NaiveDateTime,
        action: Action,
        required: f64,
        available: f64,
    },

    #[error("{action} for {symbol} at {timestamp} skipped: a trade is already open")]
    PositionOpen {
        symbol: String,
        timestamp: NaiveDateTime,
        action: Action,
    },

    /// The fill bar has no usable price; any open trade stays open.
    #[error("{action} for {symbol} at {timestamp} skipped: no fill price")]
    MissingPrice {
        symbol: String,
        timestamp: NaiveDateTime,
        action: Action,
    },
}

/// P&L columns for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarMetrics {
    pub pl: f64,
    pub value: f64,
    pub percent: f64,
}

impl BarMetrics {
    pub const EMPTY: BarMetrics = BarMetrics {
        pl: f64::NAN,
        value: f64::NAN,
        percent: f64::NAN,
    };
}

/// Cost breakdown of closing `trade` at `price`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ExitCost {
    money: f64,
    fee: f64,
    slippage: f64,
    gross: f64,
    pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Tally {
    trades: usize,
    winning_trades: usize,
    losing_trades: usize,
    gross_profit: f64,
    gross_loss: f64,
    total_fees: f64,
    total_slippage: f64,
    traded_amount: f64,
    gains: f64,
    winning_gains: f64,
    losing_gains: f64,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    profile: TradingProfile,
    sharpe: SharpeConfig,
    available_money: f64,
    capital: f64,
    open_trades: BTreeMap<String, Trade>,
    trade_history: BTreeMap<String, Vec<Trade>>,
    money_history: BTreeMap<NaiveDateTime, f64>,
    capital_history: BTreeMap<NaiveDateTime, f64>,
    tally: Tally,
    lacking_capital: usize,
    finalized: Option<ReportOverview>,
}

impl Ledger {
    pub fn new(profile: TradingProfile, sharpe: SharpeConfig) -> Self {
        let capital = profile.capital();
        Self {
            profile,
            sharpe,
            available_money: capital,
            capital,
            open_trades: BTreeMap::new(),
            trade_history: BTreeMap::new(),
            money_history: BTreeMap::new(),
            capital_history: BTreeMap::new(),
            tally: Tally::default(),
            lacking_capital: 0,
            finalized: None,
        }
    }

    /// Back to the initial state, keeping profile and Sharpe settings.
    pub fn reset(&mut self) {
        *self = Self::new(self.profile.clone(), self.sharpe.clone());
    }

    pub fn profile(&self) -> &TradingProfile {
        &self.profile
    }

    pub fn available_money(&self) -> f64 {
        self.available_money
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn lacking_capital(&self) -> usize {
        self.lacking_capital
    }

    pub fn open_trade(&self, symbol: &str) -> Option<&Trade> {
        self.open_trades.get(symbol)
    }

    pub fn trade_history(&self) -> &BTreeMap<String, Vec<Trade>> {
        &self.trade_history
    }

    /// Write `PL`, `PL_VALUE` and `PL_PERCENT` for the latest row of `symbol`.
    ///
    /// `fill` is the price field actions execute at on this bar.
    pub fn add_preprocess_metrics(
        &mut self,
        symbol: &str,
        cols: &SymbolColumns,
        table: &mut BarTable,
        fill: PriceField,
    ) -> BarMetrics {
        let action = table
            .last(cols.actions)
            .and_then(Action::from_cell)
            .unwrap_or_default();
        let close = table.last(cols.close).unwrap_or(f64::NAN);
        let fill_price = table.last(cols.price(fill)).unwrap_or(f64::NAN);

        let metrics = match self.open_trades.get(symbol) {
            Some(trade) if action.is_exit() && fill_price.is_finite() => {
                let cost = self.exit_cost(trade, fill_price);
                price_move(cost.pnl, fill_price, trade.price)
            }
            Some(trade) => {
                let sign = side_sign(trade);
                let pl = sign * (close * trade.shares - trade.money) - trade.fee;
                price_move(pl, close, trade.price)
            }
            None if action.is_entry() => self.hypothetical_entry(action, fill_price, close),
            None => BarMetrics::EMPTY,
        };

        table.set_last(cols.pl, metrics.pl);
        table.set_last(cols.pl_value, metrics.value);
        table.set_last(cols.pl_percent, metrics.percent);
        self.finalized = None;
        metrics
    }

    /// What an entry filled at `price` would show at `close`.
    fn hypothetical_entry(&self, action: Action, price: f64, close: f64) -> BarMetrics {
        let shares = self.profile.shares(price, self.available_money);
        let fee = self.profile.fee_for(price, shares);
        let money = price * shares;
        let mut pl = shares * close - money;
        if action == Action::Short {
            pl = -pl;
        }
        price_move(pl - fee, close, price)
    }

    /// Execute the latest `ACTIONS_<symbol>` cell.
    ///
    /// Returns the recorded trade, `None` for `NO_ACTION`.
    pub fn handle_action(
        &mut self,
        symbol: &str,
        cols: &SymbolColumns,
        table: &BarTable,
        fill: PriceField,
    ) -> Result<Option<Trade>, LedgerError> {
        let action = table
            .last(cols.actions)
            .and_then(Action::from_cell)
            .unwrap_or_default();
        let (Some(timestamp), Some(price)) = (table.last_timestamp(), table.last(cols.price(fill))) else {
            return Ok(None);
        };
        match action {
            Action::Long => self.long(symbol, timestamp, price).map(Some),
            Action::Short => self.short(symbol, timestamp, price).map(Some),
            Action::LongExit => self.long_exit(symbol, timestamp, price).map(Some),
            Action::ShortExit => self.short_exit(symbol, timestamp, price).map(Some),
            Action::NoAction => Ok(None),
        }
    }

    pub fn long(&mut self, symbol: &str, timestamp: NaiveDateTime, price: f64) -> Result<Trade, LedgerError> {
        self.enter(symbol, timestamp, price, Action::Long)
    }

    pub fn short(&mut self, symbol: &str, timestamp: NaiveDateTime, price: f64) -> Result<Trade, LedgerError> {
        self.enter(symbol, timestamp, price, Action::Short)
    }

    pub fn long_exit(&mut self, symbol: &str, timestamp: NaiveDateTime, price: f64) -> Result<Trade, LedgerError> {
        self.exit(symbol, timestamp, price, Action::LongExit)
    }

    pub fn short_exit(&mut self, symbol: &str, timestamp: NaiveDateTime, price: f64) -> Result<Trade, LedgerError> {
        self.exit(symbol, timestamp, price, Action::ShortExit)
    }

    fn enter(
        &mut self,
        symbol: &str,
        timestamp: NaiveDateTime,
        price: f64,
        action: Action,
    ) -> Result<Trade, LedgerError> {
        if self.open_trades.contains_key(symbol) {
            tracing::warn!(symbol, %timestamp, %action, "entry_while_open");
            return Err(LedgerError::PositionOpen {
                symbol: symbol.to_string(),
                timestamp,
                action,
            });
        }
        if !price.is_finite() {
            return Err(self.missing_price(symbol, timestamp, action));
        }
        let shares = self.profile.shares(price, self.available_money);
        let money = price * shares;
        let fee = self.profile.fee_for(price, shares);
        let slippage = self.profile.slippage_for(money);
        let required = money + fee + slippage;
        if shares.is_nan() || shares <= 0.0 || !required.is_finite() || required > self.available_money {
            tracing::warn!(
                symbol,
                %timestamp,
                %action,
                required,
                available = self.available_money,
                "entry_skipped"
            );
            return Err(LedgerError::InsufficientCapital {
                symbol: symbol.to_string(),
                timestamp,
                action,
                required,
                available: self.available_money,
            });
        }

        let trade = Trade {
            timestamp,
            action,
            symbol: symbol.to_string(),
            price,
            shares,
            money,
            fee,
            slippage,
        };
        self.available_money -= required;
        self.tally.total_fees += fee;
        self.tally.total_slippage += slippage;
        self.open_trades.insert(symbol.to_string(), trade.clone());
        self.record(trade.clone());
        tracing::info!(symbol, %timestamp, %action, price, shares, money, "trade_opened");
        Ok(trade)
    }

    fn exit(
        &mut self,
        symbol: &str,
        timestamp: NaiveDateTime,
        price: f64,
        action: Action,
    ) -> Result<Trade, LedgerError> {
        let expected = match action {
            Action::ShortExit => PositionSide::Short,
            _ => PositionSide::Long,
        };
        let entry = match self.open_trades.remove(symbol) {
            Some(trade) if trade.side() == Some(expected) => trade,
            other => {
                if let Some(trade) = other {
                    self.open_trades.insert(symbol.to_string(), trade);
                }
                self.lacking_capital += 1;
                self.finalized = None;
                tracing::warn!(symbol, %timestamp, %action, "invalid_exit");
                return Err(LedgerError::InvalidExit {
                    symbol: symbol.to_string(),
                    timestamp,
                    action,
                });
            }
        };

        if !price.is_finite() {
            self.open_trades.insert(symbol.to_string(), entry);
            return Err(self.missing_price(symbol, timestamp, action));
        }

        let cost = self.exit_cost(&entry, price);
        self.available_money += entry.money + cost.gross - cost.fee - cost.slippage;
        self.capital += cost.pnl;

        let gain = cost.pnl / entry.money;
        let tally = &mut self.tally;
        tally.trades += 1;
        tally.total_fees += cost.fee;
        tally.total_slippage += cost.slippage;
        tally.traded_amount += entry.money;
        tally.gains += gain;
        if cost.pnl > 0.0 {
            tally.winning_trades += 1;
            tally.winning_gains += gain;
            tally.gross_profit += cost.pnl;
        } else {
            tally.losing_trades += 1;
            tally.losing_gains += gain;
            tally.gross_loss += cost.pnl;
        }

        let trade = Trade {
            timestamp,
            action,
            symbol: symbol.to_string(),
            price,
            shares: entry.shares,
            money: cost.money,
            fee: cost.fee,
            slippage: cost.slippage,
        };
        self.record(trade.clone());
        tracing::info!(symbol, %timestamp, %action, price, pnl = cost.pnl, "trade_closed");
        Ok(trade)
    }

    fn missing_price(&self, symbol: &str, timestamp: NaiveDateTime, action: Action) -> LedgerError {
        tracing::warn!(symbol, %timestamp, %action, "fill_price_missing");
        LedgerError::MissingPrice {
            symbol: symbol.to_string(),
            timestamp,
            action,
        }
    }

    /// Round-trip cost of closing `entry` at `price`.
    fn exit_cost(&self, entry: &Trade, price: f64) -> ExitCost {
        let money = price * entry.shares;
        let fee = self.profile.fee_for(price, entry.shares);
        let slippage = self.profile.slippage_for(money);
        let gross = side_sign(entry) * (money - entry.money);
        ExitCost {
            money,
            fee,
            slippage,
            gross,
            pnl: gross - entry.fee - fee - entry.slippage - slippage,
        }
    }

    fn record(&mut self, trade: Trade) {
        self.money_history.insert(trade.timestamp, self.available_money);
        self.capital_history.insert(trade.timestamp, self.capital);
        self.trade_history
            .entry(trade.symbol.clone())
            .or_default()
            .push(trade);
        self.finalized = None;
    }

    /// Mean holding period in bars over closed trades.
    ///
    /// Counts the rows from entry to exit inclusive, minus one for the exit
    /// bar.
    pub fn average_bars(&self, index: &[NaiveDateTime]) -> f64 {
        if self.tally.trades == 0 {
            return 0.0;
        }
        let position = |ts: &NaiveDateTime| index.binary_search(ts).ok();
        let mut bars = 0usize;
        for trades in self.trade_history.values() {
            let mut entry: Option<&Trade> = None;
            for trade in trades {
                if trade.action.is_exit() {
                    if let Some(open) = entry.take() {
                        if let (Some(i), Some(j)) = (position(&open.timestamp), position(&trade.timestamp)) {
                            bars += j.saturating_sub(i);
                        }
                    }
                } else {
                    entry = Some(trade);
                }
            }
        }
        bars as f64 / self.tally.trades as f64
    }

    /// Capital over every row of `index`, seeded with the initial capital
    /// and forward-filled between action events.
    pub fn capital_series(&self, index: &[NaiveDateTime]) -> Vec<f64> {
        let mut series: Vec<f64> = index
            .iter()
            .map(|ts| self.capital_history.get(ts).copied().unwrap_or(f64::NAN))
            .collect();
        if let Some(first) = series.first_mut() {
            if first.is_nan() {
                *first = self.profile.capital();
            }
        }
        forward_fill(&mut series);
        series
    }

    /// Compute the aggregate statistics if anything changed since the last
    /// call. Idempotent.
    pub fn finalize_calculations(&mut self, index: &[NaiveDateTime]) -> &ReportOverview {
        let overview = match self.finalized.take() {
            Some(overview) => overview,
            None => self.build_overview(index),
        };
        self.finalized.insert(overview)
    }

    fn build_overview(&self, index: &[NaiveDateTime]) -> ReportOverview {
        let t = &self.tally;
        let per_trade = |total: f64, n: usize| if n == 0 { 0.0 } else { total / n as f64 };
        let capital = self.capital_series(index);
        ReportOverview {
            trades: t.trades,
            winning_trades: t.winning_trades,
            losing_trades: t.losing_trades,
            gross_profit: t.gross_profit,
            gross_loss: t.gross_loss,
            net_profit: t.gross_profit + t.gross_loss,
            profitability: per_trade(t.winning_trades as f64 * 100.0, t.trades),
            sharpe_ratio: sharpe_ratio(&capital, &self.sharpe),
            average_trading_amount: per_trade(t.traded_amount, t.trades),
            average_fees: per_trade(t.total_fees, t.trades),
            average_slippage: per_trade(t.total_slippage, t.trades),
            average_gains: per_trade(t.gains * 100.0, t.trades),
            average_winner: per_trade(t.winning_gains * 100.0, t.winning_trades),
            average_loser: per_trade(t.losing_gains * 100.0, t.losing_trades),
            average_bars: self.average_bars(index),
            total_fees: t.total_fees,
            total_slippage: t.total_slippage,
            lacking_capital: self.lacking_capital,
            ongoing_trades: self.open_trades.len(),
            trade_history: self.trade_history.clone(),
            available_money_history: self
                .money_history
                .iter()
                .map(|(&timestamp, &value)| HistoryPoint { timestamp, value })
                .collect(),
            available_capital_history: index
                .iter()
                .zip(capital)
                .map(|(&timestamp, value)| HistoryPoint { timestamp, value })
                .collect(),
        }
    }

    pub fn overview(&mut self, index: &[NaiveDateTime]) -> ReportOverview {
        self.finalize_calculations(index).clone()
    }
}

fn side_sign(trade: &Trade) -> f64 {
    trade.side().map_or(1.0, PositionSide::sign)
}

fn price_move(pl: f64, price: f64, entry_price: f64) -> BarMetrics {
    let value = price - entry_price;
    BarMetrics {
        pl,
        value,
        percent: value / entry_price,
    }
}
