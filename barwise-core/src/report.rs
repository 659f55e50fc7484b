//! Report overview — the ledger's structured output and its text rendering.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::Trade;

/// One point of a cash or capital time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Aggregate statistics of a simulation run.
///
/// Averages are per closed trade; gain figures are percentages. With no
/// closed trades every average is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
    /// Percent of closed trades that were profitable.
    pub profitability: f64,
    pub sharpe_ratio: f64,
    pub average_trading_amount: f64,
    pub average_fees: f64,
    pub average_slippage: f64,
    /// Mean per-trade gain in percent. A trade's gain is its realized P&L
    /// over the entry notional (`price * shares` at entry), not over the
    /// exit proceeds.
    pub average_gains: f64,
    /// Mean gain of winning trades, same base as `average_gains`.
    pub average_winner: f64,
    /// Mean gain of losing trades, same base as `average_gains`.
    pub average_loser: f64,
    pub average_bars: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
    /// Exits that found no matching open trade (typically a skipped entry).
    pub lacking_capital: usize,
    pub ongoing_trades: usize,
    pub trade_history: BTreeMap<String, Vec<Trade>>,
    /// Available cash snapshotted at every executed action.
    pub available_money_history: Vec<HistoryPoint>,
    /// Running capital over every bar, forward-filled.
    pub available_capital_history: Vec<HistoryPoint>,
}

impl fmt::Display for ReportOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trades == 0 {
            writeln!(f, "No trades")?;
            writeln!(f, "Ongoing Trades: {}", self.ongoing_trades)?;
            return write!(f, "Trades Lacking Capital: {}", self.lacking_capital);
        }
        writeln!(f, "Trades:")?;
        for (symbol, trades) in &self.trade_history {
            writeln!(f, "{symbol}")?;
            for t in trades {
                writeln!(
                    f,
                    "  {} {} {} price={} shares={} money={:.2} fee={:.2} slippage={:.2}",
                    t.timestamp, t.action, t.symbol, t.price, t.shares, t.money, t.fee, t.slippage
                )?;
            }
        }
        writeln!(f, "Profitability: {}", self.profitability)?;
        writeln!(f, "# Trades: {}", self.trades)?;
        writeln!(f, "Net Profit: {:.2}", self.net_profit)?;
        writeln!(f, "Gross Profit: {:.2}", self.gross_profit)?;
        writeln!(f, "Gross Loss: {:.2}", self.gross_loss)?;
        writeln!(f, "Winning Trades: {}", self.winning_trades)?;
        writeln!(f, "Losing Trades: {}", self.losing_trades)?;
        writeln!(f, "Sharpe Ratio: {:.4}", self.sharpe_ratio)?;
        writeln!(f, "Avg. Trading Amount: {:.2}", self.average_trading_amount)?;
        writeln!(f, "Avg. Fees: {:.2}", self.average_fees)?;
        writeln!(f, "Avg. Slippage: {:.2}", self.average_slippage)?;
        writeln!(f, "Avg. Gains: {:.4}", self.average_gains)?;
        writeln!(f, "Avg. Winner: {:.4}", self.average_winner)?;
        writeln!(f, "Avg. Loser: {:.4}", self.average_loser)?;
        writeln!(f, "Avg. Bars: {}", self.average_bars)?;
        writeln!(f, "Total Fees: {:.2}", self.total_fees)?;
        writeln!(f, "Total Slippage: {:.2}", self.total_slippage)?;
        writeln!(f, "Trades Lacking Capital: {}", self.lacking_capital)?;
        write!(f, "Ongoing Trades: {}", self.ongoing_trades)
    }
}
