//! Trading fees charged on every execution (entries and exits).

use serde::{Deserialize, Serialize};

pub trait FeeModel: Send + Sync {
    /// Fee for trading `shares` at `price`.
    fn fee(&self, price: f64, shares: f64) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradingFee {
    /// Flat amount per execution.
    Static { amount: f64 },
    /// Amount per share traded.
    PerShare { amount: f64 },
    /// Percentage of notional.
    Percent { percent: f64 },
}

impl TradingFee {
    pub fn static_fee(amount: f64) -> Self {
        TradingFee::Static { amount }
    }

    pub fn zero() -> Self {
        TradingFee::Static { amount: 0.0 }
    }
}

impl Default for TradingFee {
    fn default() -> Self {
        Self::zero()
    }
}

impl FeeModel for TradingFee {
    fn fee(&self, price: f64, shares: f64) -> f64 {
        match *self {
            TradingFee::Static { amount } => amount,
            TradingFee::PerShare { amount } => amount * shares.abs(),
            TradingFee::Percent { percent } => (price * shares).abs() * percent / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_fee_ignores_size() {
        let fee = TradingFee::static_fee(10.0);
        assert_eq!(fee.fee(25.0, 100.0), 10.0);
        assert_eq!(fee.fee(1.0, 1.0), 10.0);
    }

    #[test]
    fn per_share_and_percent() {
        assert!((TradingFee::PerShare { amount: 0.01 }.fee(25.0, 200.0) - 2.0).abs() < 1e-12);
        assert!((TradingFee::Percent { percent: 0.1 }.fee(25.0, 200.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn deserializes_tagged() {
        let fee: TradingFee = serde_json::from_str(r#"{"type":"per_share","amount":0.005}"#).unwrap();
        assert_eq!(fee, TradingFee::PerShare { amount: 0.005 });
    }
}
