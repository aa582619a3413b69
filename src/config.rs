//! Configuration for the plausibility checks

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;
use crate::utils::validation::parse_snapshot_time;

/// How duplicate business keys inside one match group are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Any counterpart with an equal key satisfies every record in the group
    #[default]
    AnyMatch,
    /// Each intraday record satisfies at most one end-of-day record
    OneToOne,
}

impl FromStr for MatchPolicy {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any_match" | "any" => Ok(MatchPolicy::AnyMatch),
            "one_to_one" | "strict" => Ok(MatchPolicy::OneToOne),
            other => Err(ReconciliationError::Config(format!(
                "unknown match policy '{}'",
                other
            ))),
        }
    }
}

/// Reconciler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Time of the first intraday snapshot of a business day
    pub first_snapshot: NaiveTime,
    /// Time of the last intraday snapshot of a business day
    pub last_snapshot: NaiveTime,
    /// Days between an end-of-day date and the first snapshot it must match
    pub previous_day_offset_days: i64,
    pub match_policy: MatchPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            first_snapshot: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            last_snapshot: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
            previous_day_offset_days: 1,
            match_policy: MatchPolicy::AnyMatch,
        }
    }
}

impl ReconcilerConfig {
    pub const FIRST_SNAPSHOT_VAR: &'static str = "MARGIN_FIRST_SNAPSHOT";
    pub const LAST_SNAPSHOT_VAR: &'static str = "MARGIN_LAST_SNAPSHOT";
    pub const MATCH_POLICY_VAR: &'static str = "MARGIN_MATCH_POLICY";

    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> ReconciliationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ReconciliationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::FIRST_SNAPSHOT_VAR) {
            config.first_snapshot = parse_config_time(Self::FIRST_SNAPSHOT_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::LAST_SNAPSHOT_VAR) {
            config.last_snapshot = parse_config_time(Self::LAST_SNAPSHOT_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::MATCH_POLICY_VAR) {
            config.match_policy = value.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which the two checks would compare the same snapshot
    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.previous_day_offset_days == 0 && self.first_snapshot == self.last_snapshot {
            return Err(ReconciliationError::Config(
                "first and last snapshot must differ when the previous-day offset is zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_config_time(key: &str, value: &str) -> ReconciliationResult<NaiveTime> {
    parse_snapshot_time(value).ok_or_else(|| {
        ReconciliationError::Config(format!("{} must be HH:MM:SS, got '{}'", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn hms(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    #[test]
    fn test_default_cutovers() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.first_snapshot, hms(8, 0, 0));
        assert_eq!(config.last_snapshot, hms(19, 0, 0));
        assert_eq!(config.previous_day_offset_days, 1);
        assert_eq!(config.match_policy, MatchPolicy::AnyMatch);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MARGIN_FIRST_SNAPSHOT", "07:30:00"),
            ("MARGIN_MATCH_POLICY", "one_to_one"),
        ]
        .into_iter()
        .collect();

        let config =
            ReconcilerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.first_snapshot, hms(7, 30, 0));
        assert_eq!(config.last_snapshot, hms(19, 0, 0));
        assert_eq!(config.match_policy, MatchPolicy::OneToOne);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_time = ReconcilerConfig::from_lookup(|key| {
            (key == "MARGIN_LAST_SNAPSHOT").then(|| "7pm".to_string())
        });
        assert!(matches!(bad_time, Err(ReconciliationError::Config(_))));

        let bad_policy = ReconcilerConfig::from_lookup(|key| {
            (key == "MARGIN_MATCH_POLICY").then(|| "fuzzy".to_string())
        });
        assert!(matches!(bad_policy, Err(ReconciliationError::Config(_))));
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = ReconcilerConfig {
            match_policy: MatchPolicy::OneToOne,
            ..ReconcilerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"one_to_one\""));
        let back: ReconcilerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
