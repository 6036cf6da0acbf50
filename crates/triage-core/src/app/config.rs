//! Triager configuration.
//!
//! Built in code or read from the environment:
//!
//! | variable              | field             | example   |
//! |-----------------------|-------------------|-----------|
//! | `TRIAGE_PROJECT`      | `project`         | `Bugs`    |
//! | `TRIAGE_ACCESS_TOKEN` | `access_token`    |           |
//! | `TRIAGE_TZ_OFFSET`    | `timezone_offset` | `+09:00`  |
//! | `TRIAGE_DRY_RUN`      | `dry_run`         | `true`    |
//! | `TRIAGE_ALL_ITEMS`    | `!only_incomplete`| `1`       |

use std::env;
use std::fmt;

use chrono::{FixedOffset, Offset, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid timezone offset '{0}' (expected e.g. +09:00, -0530 or Z)")]
    InvalidOffset(String),

    #[error("invalid boolean '{value}' in {var}")]
    InvalidBool { var: &'static str, value: String },
}

/// Source of configuration values, so tests need not touch the process environment.
pub trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment. Empty values count as unset.
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl<F: Fn(&str) -> Option<String>> EnvReader for F {
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TriagerConfig {
    /// Project name or gid.
    pub project: String,
    access_token: Option<String>,
    /// Offset used for "today" in date-only comparisons.
    pub timezone_offset: FixedOffset,
    /// Triage only incomplete items (sorting too).
    pub only_incomplete: bool,
    /// Record what would be sent without sending it.
    pub dry_run: bool,
}

impl TriagerConfig {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            access_token: None,
            timezone_offset: Utc.fix(),
            only_incomplete: true,
            dry_run: false,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timezone_offset(mut self, offset: FixedOffset) -> Self {
        self.timezone_offset = offset;
        self
    }

    pub fn with_only_incomplete(mut self, only_incomplete: bool) -> Self {
        self.only_incomplete = only_incomplete;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(&ProcessEnv)
    }

    pub fn from_reader(env: &dyn EnvReader) -> Result<Self, ConfigError> {
        let project = env
            .get("TRIAGE_PROJECT")
            .ok_or(ConfigError::Missing("TRIAGE_PROJECT"))?;
        let mut config = Self::new(project);
        config.access_token = env.get("TRIAGE_ACCESS_TOKEN");
        if let Some(offset) = env.get("TRIAGE_TZ_OFFSET") {
            config.timezone_offset = parse_offset(&offset)?;
        }
        if let Some(value) = env.get("TRIAGE_DRY_RUN") {
            config.dry_run = parse_bool("TRIAGE_DRY_RUN", &value)?;
        }
        if let Some(value) = env.get("TRIAGE_ALL_ITEMS") {
            config.only_incomplete = !parse_bool("TRIAGE_ALL_ITEMS", &value)?;
        }
        Ok(config)
    }
}

impl fmt::Debug for TriagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriagerConfig")
            .field("project", &self.project)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timezone_offset", &self.timezone_offset)
            .field("only_incomplete", &self.only_incomplete)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// `Z`, `UTC`, `+09:00`, `-0530` or `+9`.
pub fn parse_offset(input: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidOffset(input.to_string());
    let s = input.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[rstest]
    #[case::zulu("Z", 0)]
    #[case::utc("utc", 0)]
    #[case::colon("+09:00", 9 * 3600)]
    #[case::compact("-0530", -(5 * 3600 + 30 * 60))]
    #[case::hours_only("+9", 9 * 3600)]
    fn parses_offsets(#[case] input: &str, #[case] seconds: i32) {
        assert_eq!(parse_offset(input).unwrap().local_minus_utc(), seconds);
    }

    #[rstest]
    #[case("09:00")]
    #[case("+25:00")]
    #[case("+09:75")]
    #[case("+ab")]
    fn rejects_bad_offsets(#[case] input: &str) {
        assert!(matches!(parse_offset(input), Err(ConfigError::InvalidOffset(_))));
    }

    #[test]
    fn reads_from_environment() {
        let env = env_of(&[
            ("TRIAGE_PROJECT", "Bugs"),
            ("TRIAGE_ACCESS_TOKEN", "secret-token"),
            ("TRIAGE_TZ_OFFSET", "+09:00"),
            ("TRIAGE_DRY_RUN", "yes"),
        ]);
        let config = TriagerConfig::from_reader(&env).unwrap();

        assert_eq!(config.project, "Bugs");
        assert_eq!(config.access_token(), Some("secret-token"));
        assert_eq!(config.timezone_offset.local_minus_utc(), 9 * 3600);
        assert!(config.dry_run);
        assert!(config.only_incomplete);
    }

    #[test]
    fn project_is_required() {
        let env = env_of(&[]);
        assert_eq!(
            TriagerConfig::from_reader(&env),
            Err(ConfigError::Missing("TRIAGE_PROJECT"))
        );
    }

    #[test]
    fn debug_redacts_token() {
        let config = TriagerConfig::new("Bugs").with_access_token("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
