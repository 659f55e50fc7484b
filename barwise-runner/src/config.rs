//! Serializable strategy configuration.
//!
//! A [`StrategyConfig`] captures everything needed to reproduce a run:
//! trading profile, engine settings, indicators and criteria groups. It loads
//! from TOML or JSON. Action names go through the alias parser and column
//! names through the naming-convention parser once, at load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use barwise_core::criteria::{
    Above, BarsSinceAction, Below, CrossingAbove, CrossingBelow, Criterion, Equals, InMarket,
    InRange, IsDay, IsLong, IsMonth, IsShort, IsWeekday, IsYear, Not, Operand, SinceCondition,
    StopLoss, TakeProfit, TrailingStop,
};
use barwise_core::domain::Action;
use barwise_core::engine::{EngineConfig, Strategy};
use barwise_core::group::{CriteriaGroup, StrategyError};
use barwise_core::indicators::{Indicator, Shift, Sma};
use barwise_core::profile::TradingProfile;
use barwise_core::table::ColumnKey;

/// Content-addressable identifier of a configuration.
pub type Fingerprint = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("strategy has no criteria groups")]
    NoGroups,
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Complete, serializable description of a strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub profile: TradingProfile,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Computed once on the source table, in order.
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,
    pub groups: Vec<GroupConfig>,
}

/// One criteria group: all criteria must hold for `action` on `symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub symbol: String,
    pub action: Action,
    #[serde(default)]
    pub criteria: Vec<CriterionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorConfig {
    Sma { column: ColumnKey, period: usize },
    Shift { column: ColumnKey, periods: usize },
}

fn one() -> usize {
    1
}

/// Serializable criterion (tagged enum), turned into a trait object by
/// [`CriterionConfig::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriterionConfig {
    Above {
        column: ColumnKey,
        other: Operand,
        #[serde(default = "one")]
        lookback: usize,
    },
    Below {
        column: ColumnKey,
        other: Operand,
        #[serde(default = "one")]
        lookback: usize,
    },
    Equals {
        column: ColumnKey,
        other: Operand,
        #[serde(default = "one")]
        lookback: usize,
    },
    CrossingAbove { column: ColumnKey, other: Operand },
    CrossingBelow { column: ColumnKey, other: Operand },
    InRange { column: ColumnKey, min: Operand, max: Operand },
    IsYear { year: i32 },
    IsMonth { month: u32 },
    IsDay { day: u32 },
    /// 0 = Monday.
    IsWeekday { weekday: u32 },
    InMarket { symbol: String },
    IsLong { symbol: String },
    IsShort { symbol: String },
    StopLoss {
        symbol: String,
        value: f64,
        #[serde(default)]
        short: bool,
        #[serde(default)]
        percent: bool,
    },
    TakeProfit {
        symbol: String,
        value: f64,
        #[serde(default)]
        short: bool,
        #[serde(default)]
        percent: bool,
    },
    TrailingStop {
        symbol: String,
        value: f64,
        #[serde(default)]
        short: bool,
        #[serde(default)]
        percent: bool,
    },
    #[serde(alias = "time_since_action")]
    BarsSinceAction {
        symbol: String,
        action: Action,
        periods: usize,
        #[serde(default)]
        condition: SinceCondition,
    },
    Not { criterion: Box<CriterionConfig> },
}

impl CriterionConfig {
    pub fn build(&self) -> Box<dyn Criterion> {
        match self {
            CriterionConfig::Above { column, other, lookback } => {
                Box::new(Above::new(column.clone(), other.clone()).lookback(*lookback))
            }
            CriterionConfig::Below { column, other, lookback } => {
                Box::new(Below::new(column.clone(), other.clone()).lookback(*lookback))
            }
            CriterionConfig::Equals { column, other, lookback } => {
                Box::new(Equals::new(column.clone(), other.clone()).lookback(*lookback))
            }
            CriterionConfig::CrossingAbove { column, other } => {
                Box::new(CrossingAbove::new(column.clone(), other.clone()))
            }
            CriterionConfig::CrossingBelow { column, other } => {
                Box::new(CrossingBelow::new(column.clone(), other.clone()))
            }
            CriterionConfig::InRange { column, min, max } => {
                Box::new(InRange::new(column.clone(), min.clone(), max.clone()))
            }
            CriterionConfig::IsYear { year } => Box::new(IsYear::new(*year)),
            CriterionConfig::IsMonth { month } => Box::new(IsMonth::new(*month)),
            CriterionConfig::IsDay { day } => Box::new(IsDay::new(*day)),
            CriterionConfig::IsWeekday { weekday } => Box::new(IsWeekday::new(*weekday)),
            CriterionConfig::InMarket { symbol } => Box::new(InMarket::new(symbol)),
            CriterionConfig::IsLong { symbol } => Box::new(IsLong::new(symbol)),
            CriterionConfig::IsShort { symbol } => Box::new(IsShort::new(symbol)),
            CriterionConfig::StopLoss { symbol, value, short, percent } => {
                let mut c = StopLoss::new(symbol, *value);
                if *short {
                    c = c.short();
                }
                if *percent {
                    c = c.percent();
                }
                Box::new(c)
            }
            CriterionConfig::TakeProfit { symbol, value, short, percent } => {
                let mut c = TakeProfit::new(symbol, *value);
                if *short {
                    c = c.short();
                }
                if *percent {
                    c = c.percent();
                }
                Box::new(c)
            }
            CriterionConfig::TrailingStop { symbol, value, short, percent } => {
                let mut c = TrailingStop::new(symbol, *value);
                if *short {
                    c = c.short();
                }
                if *percent {
                    c = c.percent();
                }
                Box::new(c)
            }
            CriterionConfig::BarsSinceAction { symbol, action, periods, condition } => {
                Box::new(BarsSinceAction::new(symbol, *action, *periods).condition(*condition))
            }
            CriterionConfig::Not { criterion } => Box::new(Not::boxed(criterion.build())),
        }
    }
}

impl IndicatorConfig {
    pub fn build(&self) -> Result<Box<dyn Indicator>, ConfigError> {
        match self {
            IndicatorConfig::Sma { column, period } => {
                if *period == 0 {
                    return Err(ConfigError::InvalidParameter {
                        name: format!("sma period for {column}"),
                        reason: "must be >= 1".into(),
                    });
                }
                Ok(Box::new(Sma::new(column.clone(), *period)))
            }
            IndicatorConfig::Shift { column, periods } => {
                Ok(Box::new(Shift::new(column.clone(), *periods)))
            }
        }
    }
}

impl StrategyConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a `.json` file, or TOML for any other extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Deterministic blake3 hex digest of the canonical JSON form.
    ///
    /// Two runs with identical configurations share a fingerprint.
    pub fn fingerprint(&self) -> Result<Fingerprint, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn build_indicators(&self) -> Result<Vec<Box<dyn Indicator>>, ConfigError> {
        self.indicators.iter().map(IndicatorConfig::build).collect()
    }

    pub fn build_groups(&self) -> Result<Vec<CriteriaGroup>, ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }
        self.groups
            .iter()
            .map(|g| {
                let criteria = g.criteria.iter().map(CriterionConfig::build).collect();
                Ok(CriteriaGroup::new(criteria, g.action, g.symbol.as_str())?)
            })
            .collect()
    }

    /// Assemble a ready-to-run strategy.
    pub fn build(&self) -> Result<Strategy, ConfigError> {
        let groups = self.build_groups()?;
        Ok(Strategy::new(groups, self.profile.clone()).with_config(self.engine.clone()))
    }
}
