//! Harness configuration parsed from environment variables.
//!
//! Every setting can be overridden through a variable prefixed with
//! `GHERKIN_SUITE_`.

use std::env;
use std::str::FromStr;

use gherkin_suite_adapter::RunOptions;

use crate::error::ConfigError;

const LOG_LEVEL_VAR: &str = "GHERKIN_SUITE_LOG_LEVEL";
const FAIL_FAST_VAR: &str = "GHERKIN_SUITE_FAIL_FAST";
const FEATURE_URI_VAR: &str = "GHERKIN_SUITE_FEATURE_URI";

/// Log level matching the `tracing` levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every span and event.
    Trace,
    /// Per-transition detail.
    Debug,
    /// Run summaries.
    #[default]
    Info,
    /// Recorded tree faults.
    Warn,
    /// Failed runs only.
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ConfigError::LogLevel(s.to_owned())),
        }
    }
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    #[must_use]
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

/// Settings shared by every suite a harness registers.
///
/// # Environment Variables
///
/// - `GHERKIN_SUITE_LOG_LEVEL`: trace, debug, info, warn or error
/// - `GHERKIN_SUITE_FAIL_FAST`: stop a feature after its first failed test
/// - `GHERKIN_SUITE_FEATURE_URI`: uri feature sources are compiled under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Stop a feature after its first failed test.
    pub fail_fast: bool,
    /// Uri feature sources are compiled under.
    pub feature_uri: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let options = RunOptions::default();
        Self {
            log_level: LogLevel::default(),
            fail_fast: options.fail_fast,
            feature_uri: options.feature_uri,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use gherkin_suite::{HarnessConfig, LogLevel};
    ///
    /// let config = HarnessConfig::from_lookup(|key| match key {
    ///     "GHERKIN_SUITE_LOG_LEVEL" => Some("debug".into()),
    ///     "GHERKIN_SUITE_FAIL_FAST" => Some("yes".into()),
    ///     _ => None,
    /// });
    /// let config = config.unwrap_or_else(|err| panic!("valid config: {err}"));
    /// assert_eq!(config.log_level, LogLevel::Debug);
    /// assert!(config.fail_fast);
    /// assert_eq!(config.feature_uri, "/feature");
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            config.log_level = value.parse()?;
        }
        if let Some(value) = lookup(FAIL_FAST_VAR) {
            config.fail_fast = parse_flag(&value).ok_or(ConfigError::Flag {
                var: FAIL_FAST_VAR,
                value,
            })?;
        }
        if let Some(value) = lookup(FEATURE_URI_VAR) {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(FEATURE_URI_VAR));
            }
            config.feature_uri = value;
        }
        Ok(config)
    }

    /// Apply optional overrides on top of environment-derived values.
    #[must_use]
    pub fn apply_overrides(
        mut self,
        log_level: Option<LogLevel>,
        fail_fast: Option<bool>,
    ) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(enabled) = fail_fast {
            self.fail_fast = enabled;
        }
        self
    }

    /// Use `level`.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Enable or disable fail-fast.
    #[must_use]
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Options for the orchestrator of each registered suite.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions::default()
            .with_feature_uri(self.feature_uri.clone())
            .with_fail_fast(self.fail_fast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    fn log_level_parses_valid_values(#[case] raw: &str, #[case] expected: LogLevel) {
        assert_eq!(raw.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let err = "loud".parse::<LogLevel>().err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("unknown log level 'loud'")));
    }

    #[test]
    fn parse_flag_understands_common_values() {
        for truthy in ["1", "true", "TRUE", "yes", "On"] {
            assert_eq!(parse_flag(truthy), Some(true), "expected {truthy} to be truthy");
        }
        for falsy in ["0", "false", "No", "off", " OFF "] {
            assert_eq!(parse_flag(falsy), Some(false), "expected {falsy} to be falsy");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = HarnessConfig::from_lookup(lookup_in(&[]));
        assert_eq!(config, Ok(HarnessConfig::default()));
        let options = HarnessConfig::default().run_options();
        assert!(!options.fail_fast);
        assert_eq!(options.feature_uri, "/feature");
    }

    #[test]
    fn variables_override_defaults() {
        let config = HarnessConfig::from_lookup(lookup_in(&[
            ("GHERKIN_SUITE_FAIL_FAST", "on"),
            ("GHERKIN_SUITE_FEATURE_URI", "/checkout.feature"),
        ]))
        .unwrap_or_else(|err| panic!("valid config: {err}"));
        let options = config.run_options();
        assert!(options.fail_fast);
        assert_eq!(options.feature_uri, "/checkout.feature");
        assert_eq!(options.base_uri, "/");
    }

    #[rstest]
    #[case("GHERKIN_SUITE_LOG_LEVEL", "chatty")]
    #[case("GHERKIN_SUITE_FAIL_FAST", "sometimes")]
    #[case("GHERKIN_SUITE_FEATURE_URI", "  ")]
    fn invalid_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        assert!(HarnessConfig::from_lookup(lookup_in(&[(key, value)])).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let config = HarnessConfig::default()
            .with_fail_fast(true)
            .apply_overrides(Some(LogLevel::Error), Some(false));
        assert_eq!(config.log_level, LogLevel::Error);
        assert!(!config.fail_fast);
        let untouched = HarnessConfig::default().apply_overrides(None, None);
        assert_eq!(untouched, HarnessConfig::default());
    }
}
