//! ReminderConfig - coordinator の設定
//!
//! JSON から読み込み、環境変数で上書きする。値は `normalized()` で下限に丸める。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const WORKER_TIMEOUT_ENV: &str = "REMINDER_WORKER_TIMEOUT_SECS";
pub const MAX_IN_FLIGHT_ENV: &str = "REMINDER_MAX_IN_FLIGHT";
pub const HORIZON_ENV: &str = "REMINDER_HORIZON_HOURS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Bounded lifetime of one worker, counted from the moment it starts running.
    pub worker_timeout_secs: u64,

    /// Cap on concurrently running workers; `None` runs every user at once.
    pub max_in_flight: Option<usize>,

    /// Only tasks due within this many hours count; `None` means no upper bound.
    pub reminder_horizon_hours: Option<u64>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            worker_timeout_secs: 30,
            max_in_flight: None,
            reminder_horizon_hours: None,
        }
    }
}

impl ReminderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `REMINDER_*` overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(WORKER_TIMEOUT_ENV) {
            self.worker_timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: WORKER_TIMEOUT_ENV,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(MAX_IN_FLIGHT_ENV) {
            self.max_in_flight = parse_optional(MAX_IN_FLIGHT_ENV, &value, "unlimited")?;
        }
        if let Some(value) = lookup(HORIZON_ENV) {
            self.reminder_horizon_hours = parse_optional(HORIZON_ENV, &value, "none")?;
        }
        self.validated()
    }

    /// Reject values that cannot be represented, then normalise.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let unrepresentable = self
            .reminder_horizon_hours
            .filter(|hours| horizon_from_hours(*hours).is_none());
        if let Some(hours) = unrepresentable {
            return Err(ConfigError::OutOfRange {
                name: "reminder_horizon_hours",
                value: hours,
            });
        }
        Ok(self.normalized())
    }

    pub fn normalized(mut self) -> Self {
        self.worker_timeout_secs = self.worker_timeout_secs.max(1);
        self.max_in_flight = self.max_in_flight.map(|n| n.max(1));
        self
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    /// `None` also for an unrepresentable horizon; `validated()` rejects those.
    pub fn reminder_horizon(&self) -> Option<chrono::Duration> {
        self.reminder_horizon_hours.and_then(horizon_from_hours)
    }
}

fn horizon_from_hours(hours: u64) -> Option<chrono::Duration> {
    i64::try_from(hours).ok().and_then(chrono::Duration::try_hours)
}

/// Empty or `unset_word` clears the value.
fn parse_optional<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
    unset_word: &str,
) -> Result<Option<T>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == unset_word {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_thirty_second_timeout() {
        let config = ReminderConfig::default();
        assert_eq!(config.worker_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_in_flight, None);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = ReminderConfig::from_json_str(r#"{"max_in_flight": 4}"#).unwrap();
        assert_eq!(config.worker_timeout_secs, 30);
        assert_eq!(config.max_in_flight, Some(4));
    }

    #[test]
    fn zero_values_are_normalized() {
        let config =
            ReminderConfig::from_json_str(r#"{"worker_timeout_secs": 0, "max_in_flight": 0}"#)
                .unwrap();
        assert_eq!(config.worker_timeout_secs, 1);
        assert_eq!(config.max_in_flight, Some(1));
    }

    #[test]
    fn env_overrides_win() {
        let config = ReminderConfig::default()
            .apply_env_overrides(env(&[
                (WORKER_TIMEOUT_ENV, "5"),
                (MAX_IN_FLIGHT_ENV, "8"),
            ]))
            .unwrap();
        assert_eq!(config.worker_timeout_secs, 5);
        assert_eq!(config.max_in_flight, Some(8));

        let unlimited = config
            .apply_env_overrides(env(&[(MAX_IN_FLIGHT_ENV, "unlimited")]))
            .unwrap();
        assert_eq!(unlimited.max_in_flight, None);
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let err = ReminderConfig::default()
            .apply_env_overrides(env(&[(WORKER_TIMEOUT_ENV, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name, .. } if name == WORKER_TIMEOUT_ENV));
    }

    #[rstest]
    #[case::one_day(24, Some(chrono::Duration::days(1)))]
    #[case::zero(0, Some(chrono::Duration::zero()))]
    fn horizon_hours_become_a_duration(
        #[case] hours: u64,
        #[case] expected: Option<chrono::Duration>,
    ) {
        let json = format!(r#"{{"reminder_horizon_hours": {hours}}}"#);
        let config = ReminderConfig::from_json_str(&json).unwrap();
        assert_eq!(config.reminder_horizon(), expected);
    }

    #[rstest]
    #[case::beyond_chrono_range(10_000_000_000_000)]
    #[case::beyond_i64(u64::MAX)]
    fn oversized_horizon_is_rejected(#[case] hours: u64) {
        let json = format!(r#"{{"reminder_horizon_hours": {hours}}}"#);
        let err = ReminderConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { value, .. } if value == hours));

        let direct = ReminderConfig {
            reminder_horizon_hours: Some(hours),
            ..ReminderConfig::default()
        };
        assert_eq!(direct.reminder_horizon(), None);
    }

    #[test]
    fn horizon_env_override_is_validated() {
        let config = ReminderConfig::default()
            .apply_env_overrides(env(&[(HORIZON_ENV, "48")]))
            .unwrap();
        assert_eq!(config.reminder_horizon(), Some(chrono::Duration::hours(48)));

        let cleared = config
            .apply_env_overrides(env(&[(HORIZON_ENV, "none")]))
            .unwrap();
        assert_eq!(cleared.reminder_horizon_hours, None);

        let err = ReminderConfig::default()
            .apply_env_overrides(env(&[(HORIZON_ENV, "10000000000000")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ReminderConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
