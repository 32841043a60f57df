//! Structured logging configured from [`HarnessConfig`].
//!
//! Output goes to stderr. Records the engine emits through `log` are
//! forwarded to the same subscriber.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::HarnessConfig;

fn filter_from_config(config: &HarnessConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Install a stderr `tracing` subscriber at the configured level.
///
/// Closing `feature_run` spans are logged with their duration. Returns
/// `false` when a subscriber or `log` bridge was already installed, in which
/// case the existing one stays in place.
pub fn init_logging(config: &HarnessConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use serial_test::serial;

    #[test]
    #[serial]
    fn second_installation_is_ignored() {
        let config = HarnessConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config.with_log_level(LogLevel::Trace)));
    }

    #[test]
    fn filter_follows_the_configured_level() {
        let config = HarnessConfig::default().with_log_level(LogLevel::Warn);
        assert_eq!(filter_from_config(&config).to_string(), "warn");
    }
}
