//! Errors raised while configuring a harness.

use thiserror::Error;

/// An invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The log level is not one of trace, debug, info, warn or error.
    #[error("unknown log level '{0}', expected one of: trace, debug, info, warn, error")]
    LogLevel(String),

    /// A boolean variable holds something other than a recognised flag.
    #[error("invalid value '{value}' for {var}, expected 1/0, true/false, yes/no or on/off")]
    Flag {
        /// Variable name.
        var: &'static str,
        /// Value as found.
        value: String,
    },

    /// The feature uri is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_error_names_the_variable() {
        let err = ConfigError::Flag {
            var: "GHERKIN_SUITE_FAIL_FAST",
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'maybe' for GHERKIN_SUITE_FAIL_FAST, expected 1/0, true/false, yes/no or on/off"
        );
    }
}
