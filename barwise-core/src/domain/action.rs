//! Action — what a criteria group asks the strategy to do in the market.
//!
//! Actions are parsed once at the configuration boundary. Parsing is
//! case-insensitive and ignores spaces, underscores and dashes, so
//! `"LongExit"`, `"exit_long"` and `"EXITLONG"` all denote [`Action::LongExit`].
//! After parsing, actions compare by enum value only.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A market action for one instrument.
///
/// The integer codes are part of the external table contract
/// (`ACTIONS_<symbol>` column): NO_ACTION=0, LONG=1, SHORT=2, LONG_EXIT=-1,
/// SHORT_EXIT=-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Action {
    #[default]
    NoAction,
    Long,
    Short,
    LongExit,
    ShortExit,
}

/// Unrecognized action spelling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0:?}")]
pub struct ActionParseError(pub String);

impl Action {
    pub const ALL: [Action; 5] = [
        Action::NoAction,
        Action::Long,
        Action::Short,
        Action::LongExit,
        Action::ShortExit,
    ];

    /// Raw integer code stored in the `ACTIONS_<symbol>` column.
    pub const fn code(self) -> i8 {
        match self {
            Action::NoAction => 0,
            Action::Long => 1,
            Action::Short => 2,
            Action::LongExit => -1,
            Action::ShortExit => -2,
        }
    }

    /// Inverse of [`Action::code`]. Returns `None` for unknown codes.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Action::NoAction),
            1 => Some(Action::Long),
            2 => Some(Action::Short),
            -1 => Some(Action::LongExit),
            -2 => Some(Action::ShortExit),
            _ => None,
        }
    }

    /// Decode a table cell. NaN and non-integral values decode to `None`.
    pub fn from_cell(value: f64) -> Option<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        Self::from_code(value as i64)
    }

    pub fn as_cell(self) -> f64 {
        f64::from(self.code())
    }

    pub fn is_entry(self) -> bool {
        matches!(self, Action::Long | Action::Short)
    }

    pub fn is_exit(self) -> bool {
        matches!(self, Action::LongExit | Action::ShortExit)
    }

    /// Canonical upper-case name (`LONG`, `SHORT_EXIT`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Action::NoAction => "NO_ACTION",
            Action::Long => "LONG",
            Action::Short => "SHORT",
            Action::LongExit => "LONG_EXIT",
            Action::ShortExit => "SHORT_EXIT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "long" => Ok(Action::Long),
            "short" => Ok(Action::Short),
            "longexit" | "exitlong" => Ok(Action::LongExit),
            "shortexit" | "exitshort" => Ok(Action::ShortExit),
            "noaction" => Ok(Action::NoAction),
            _ => Err(ActionParseError(s.to_string())),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_table_contract() {
        assert_eq!(Action::NoAction.code(), 0);
        assert_eq!(Action::Long.code(), 1);
        assert_eq!(Action::Short.code(), 2);
        assert_eq!(Action::LongExit.code(), -1);
        assert_eq!(Action::ShortExit.code(), -2);
        for action in Action::ALL {
            assert_eq!(Action::from_code(i64::from(action.code())), Some(action));
        }
        assert_eq!(Action::from_code(3), None);
    }

    #[test]
    fn parses_long_exit_aliases() {
        for raw in ["LongExit", "exit_long", "EXITLONG", "long-exit", "Long Exit", "LONG_EXIT"] {
            assert_eq!(raw.parse::<Action>().unwrap(), Action::LongExit, "{raw}");
        }
    }

    #[test]
    fn parses_short_exit_aliases() {
        for raw in ["ShortExit", "exit_short", "EXITSHORT", "short exit"] {
            assert_eq!(raw.parse::<Action>().unwrap(), Action::ShortExit, "{raw}");
        }
    }

    #[test]
    fn parses_entries_case_insensitively() {
        assert_eq!("LONG".parse::<Action>().unwrap(), Action::Long);
        assert_eq!("long".parse::<Action>().unwrap(), Action::Long);
        assert_eq!("Short".parse::<Action>().unwrap(), Action::Short);
        assert_eq!("no_action".parse::<Action>().unwrap(), Action::NoAction);
    }

    #[test]
    fn rejects_unknown_spelling() {
        let err = "longshort".parse::<Action>().unwrap_err();
        assert_eq!(err, ActionParseError("longshort".into()));
        // "exit" alone is ambiguous
        assert!("exit".parse::<Action>().is_err());
    }

    #[test]
    fn cell_decoding() {
        assert_eq!(Action::from_cell(-1.0), Some(Action::LongExit));
        assert_eq!(Action::from_cell(f64::NAN), None);
        assert_eq!(Action::from_cell(0.5), None);
        assert_eq!(Action::ShortExit.as_cell(), -2.0);
    }

    #[test]
    fn serde_uses_alias_parser() {
        let action: Action = serde_json::from_str("\"exit-long\"").unwrap();
        assert_eq!(action, Action::LongExit);
        assert_eq!(serde_json::to_string(&Action::ShortExit).unwrap(), "\"SHORT_EXIT\"");
    }
}
