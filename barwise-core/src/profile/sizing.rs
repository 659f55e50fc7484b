//! Position sizing — how many shares an entry buys.
//!
//! Rounding is half-away-from-zero (`f64::round`). A non-positive or NaN
//! price sizes to zero shares.

use serde::{Deserialize, Serialize};

/// Translate a price and the available cash into a share count.
pub trait Sizer: Send + Sync {
    fn shares(&self, price: f64, available_cash: f64) -> f64;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradingAmount {
    /// Approximate a fixed notional per entry.
    StaticAmount {
        amount: f64,
        #[serde(default)]
        round_up: bool,
    },
    /// Always the same share count.
    NumberOfShares { shares: f64 },
    /// A percentage of the currently available cash.
    CapitalPercentage { percent: f64 },
    /// Kelly fraction `W - (1 - W) / R` of available cash, clamped to [0, 1].
    ///
    /// `R` is `average_gain / average_loss`.
    KellyCriterion {
        win_probability: f64,
        average_gain: f64,
        average_loss: f64,
    },
}

impl TradingAmount {
    pub fn static_amount(amount: f64) -> Self {
        TradingAmount::StaticAmount {
            amount,
            round_up: false,
        }
    }

    pub fn number_of_shares(shares: f64) -> Self {
        TradingAmount::NumberOfShares { shares }
    }

    pub fn capital_percentage(percent: f64) -> Self {
        TradingAmount::CapitalPercentage { percent }
    }

    /// Kelly fraction, or `None` when the win/loss ratio is undefined.
    pub fn kelly_fraction(win_probability: f64, average_gain: f64, average_loss: f64) -> Option<f64> {
        let ratio = average_gain / average_loss.abs();
        if !ratio.is_finite() || ratio <= 0.0 {
            return None;
        }
        let fraction = win_probability - (1.0 - win_probability) / ratio;
        fraction.is_finite().then(|| fraction.clamp(0.0, 1.0))
    }
}

impl Sizer for TradingAmount {
    fn shares(&self, price: f64, available_cash: f64) -> f64 {
        if price.is_nan() || price <= 0.0 {
            return 0.0;
        }
        match *self {
            TradingAmount::StaticAmount { amount, round_up } => {
                let raw = amount / price;
                if round_up {
                    raw.ceil()
                } else {
                    raw.round()
                }
            }
            TradingAmount::NumberOfShares { shares } => shares,
            TradingAmount::CapitalPercentage { percent } => {
                (percent * available_cash / price / 100.0).round()
            }
            TradingAmount::KellyCriterion {
                win_probability,
                average_gain,
                average_loss,
            } => Self::kelly_fraction(win_probability, average_gain, average_loss)
                .map_or(0.0, |f| (f * available_cash / price).round()),
        }
    }

    fn name(&self) -> &str {
        match self {
            TradingAmount::StaticAmount { .. } => "static_amount",
            TradingAmount::NumberOfShares { .. } => "number_of_shares",
            TradingAmount::CapitalPercentage { .. } => "capital_percentage",
            TradingAmount::KellyCriterion { .. } => "kelly_criterion",
        }
    }
}
