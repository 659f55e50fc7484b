//! Trade — one execution recorded by the ledger (an entry or an exit).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Action;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1.0 for long, -1.0 for short. Multiplies a price delta into P&L.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

/// A single execution in the market.
///
/// Entries (`LONG`/`SHORT`) become the symbol's open trade; exits
/// (`LONG_EXIT`/`SHORT_EXIT`) close it. Both are appended to the per-symbol
/// trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub action: Action,
    pub symbol: String,
    pub price: f64,
    pub shares: f64,
    /// Notional: `price * shares`.
    pub money: f64,
    pub fee: f64,
    pub slippage: f64,
}

impl Trade {
    /// Side of the position this trade opens or closes.
    pub fn side(&self) -> Option<PositionSide> {
        match self.action {
            Action::Long | Action::LongExit => Some(PositionSide::Long),
            Action::Short | Action::ShortExit => Some(PositionSide::Short),
            Action::NoAction => None,
        }
    }

    /// Total cash cost of an entry: notional plus fee and slippage.
    pub fn cost(&self) -> f64 {
        self.money + self.fee + self.slippage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn side_follows_action() {
        let trade = Trade {
            timestamp: NaiveDate::from_ymd_opt(2010, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            action: Action::ShortExit,
            symbol: "MSFT".into(),
            price: 25.0,
            shares: 10.0,
            money: 250.0,
            fee: 1.0,
            slippage: 0.5,
        };
        assert_eq!(trade.side(), Some(PositionSide::Short));
        assert_eq!(trade.side().unwrap().sign(), -1.0);
        assert!((trade.cost() - 251.5).abs() < 1e-12);
    }
}
