//! Trading profile — starting capital, sizing policy, fee policy, slippage.
//!
//! Immutable once built; the ledger only reads it.

pub mod fee;
pub mod sizing;

pub use fee::{FeeModel, TradingFee};
pub use sizing::{Sizer, TradingAmount};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingProfile {
    capital: f64,
    amount: TradingAmount,
    #[serde(default)]
    fee: TradingFee,
    /// Percent of notional charged per execution.
    #[serde(default)]
    slippage: f64,
}

impl TradingProfile {
    pub fn new(capital: f64, amount: TradingAmount, fee: TradingFee) -> Self {
        Self {
            capital,
            amount,
            fee,
            slippage: 0.0,
        }
    }

    pub fn with_slippage(mut self, percent: f64) -> Self {
        self.slippage = percent;
        self
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn amount(&self) -> &TradingAmount {
        &self.amount
    }

    pub fn fee(&self) -> &TradingFee {
        &self.fee
    }

    pub fn slippage(&self) -> f64 {
        self.slippage
    }

    pub fn shares(&self, price: f64, available_cash: f64) -> f64 {
        self.amount.shares(price, available_cash)
    }

    pub fn fee_for(&self, price: f64, shares: f64) -> f64 {
        self.fee.fee(price, shares)
    }

    /// Slippage cost on `money` of notional.
    pub fn slippage_for(&self, money: f64) -> f64 {
        money.abs() * self.slippage / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_is_percent_of_notional() {
        let profile = TradingProfile::new(
            10_000.0,
            TradingAmount::static_amount(5000.0),
            TradingFee::static_fee(5.0),
        )
        .with_slippage(0.5);
        assert!((profile.slippage_for(5000.0) - 25.0).abs() < 1e-12);
        assert_eq!(profile.fee_for(25.0, 100.0), 5.0);
        assert_eq!(profile.shares(25.0, 10_000.0), 200.0);
    }

    #[test]
    fn fee_and_slippage_default_to_zero() {
        let profile: TradingProfile = serde_json::from_str(
            r#"{"capital":10000.0,"amount":{"type":"number_of_shares","shares":10.0}}"#,
        )
        .unwrap();
        assert_eq!(profile.slippage(), 0.0);
        assert_eq!(profile.fee(), &TradingFee::zero());
    }
}
