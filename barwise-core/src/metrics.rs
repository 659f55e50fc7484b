//! Return statistics — pure functions over capital series.
//!
//! NaN cells are skipped by the aggregates (pandas semantics). Degenerate
//! inputs (fewer than two returns, zero variance) yield NaN, never a panic.

use serde::{Deserialize, Serialize};

/// Benchmark subtracted from per-period returns before the Sharpe ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Benchmark {
    #[default]
    None,
    /// Flat annualized return in percent (5.0 = 5%).
    AnnualRate { percent: f64 },
    /// Benchmark level series aligned with the bar index.
    Series { values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpeConfig {
    /// Periods per year used to annualize (252 for daily bars).
    #[serde(default = "default_periods")]
    pub periods: f64,
    #[serde(default)]
    pub benchmark: Benchmark,
}

fn default_periods() -> f64 {
    252.0
}

impl Default for SharpeConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            benchmark: Benchmark::None,
        }
    }
}

/// `values[i] / values[i - 1] - 1`; the first element is NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(values.windows(2).map(|w| w[1] / w[0] - 1.0));
    out
}

/// Replace NaN with the last seen non-NaN value.
pub fn forward_fill(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
}

/// Mean of the non-NaN values; NaN if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation (ddof = 1) of the non-NaN values.
pub fn std_dev(values: &[f64]) -> f64 {
    let clean: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if clean.len() < 2 {
        return f64::NAN;
    }
    let m = mean(&clean);
    let variance = clean.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (clean.len() - 1) as f64;
    variance.sqrt()
}

/// Annualized Sharpe ratio of a capital (equity) series.
///
/// `sqrt(periods) * mean(excess) / std(excess)` over `pct_change(capital)`.
/// NaN when the returns have zero variance or there are fewer than two.
pub fn sharpe_ratio(capital: &[f64], config: &SharpeConfig) -> f64 {
    let returns = pct_change(capital);
    let excess: Vec<f64> = match &config.benchmark {
        Benchmark::None => returns,
        Benchmark::AnnualRate { percent } => {
            let per_period = percent / 100.0 / config.periods;
            returns.iter().map(|r| r - per_period).collect()
        }
        Benchmark::Series { values } => {
            let bench = pct_change(values);
            returns
                .iter()
                .enumerate()
                .map(|(i, r)| r - bench.get(i).copied().unwrap_or(f64::NAN))
                .collect()
        }
    };
    let std = std_dev(&excess);
    if std.is_nan() || std < 1e-15 {
        return f64::NAN;
    }
    config.periods.sqrt() * mean(&excess) / std
}
