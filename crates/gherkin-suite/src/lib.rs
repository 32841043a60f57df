//! Register Gherkin features as host test suites.
//!
//! Each call to [`register_cucumber`] turns one feature source into a
//! [`FeatureSuite`]: a named suite whose tests are the feature's scenarios,
//! reported to a [`Host`] as they start and end. Step definitions are
//! supplied as initializers that register through [`StepDefinitions`].
//!
//! # Configuration
//!
//! [`HarnessConfig::from_env`] reads:
//!
//! - `GHERKIN_SUITE_LOG_LEVEL`: log verbosity (trace, debug, info, warn,
//!   error)
//! - `GHERKIN_SUITE_FAIL_FAST`: stop a feature after its first failed test
//! - `GHERKIN_SUITE_FEATURE_URI`: uri feature sources are compiled under
//!
//! # Example
//!
//! ```
//! use gherkin_suite::{
//!     Acknowledgement, HarnessConfig, Host, HostEvent, Initializer, RootSuite, StepDefinitions,
//!     acknowledged, get_interface,
//! };
//!
//! struct Quiet;
//!
//! impl Host for Quiet {
//!     fn emit(&self, _event: HostEvent<'_>) -> Acknowledgement {
//!         acknowledged()
//!     }
//! }
//!
//! let mut root: RootSuite = RootSuite::new(HarnessConfig::default());
//! let steps: Initializer = Box::new(|s: &mut StepDefinitions| {
//!     s.given("x = {int}", |_, _| Ok(()));
//! });
//! get_interface(&mut root).register_cucumber(
//!     "arithmetic",
//!     "Feature: F\nScenario: S\nGiven x = 5",
//!     vec![steps],
//! );
//! assert_eq!(root.run_blocking(&Quiet).ok(), Some(true));
//! ```

pub mod config;
pub mod error;
mod interface;
pub mod logging;
mod suite;

pub use config::{HarnessConfig, LogLevel};
pub use error::ConfigError;
pub use interface::{CucumberInterface, get_interface, register_cucumber};
pub use logging::init_logging;
pub use suite::{FeatureSuite, RemoteHandle, RootSuite, SuiteParent};

pub use gherkin_suite_adapter::{
    Acknowledgement, Host, HostEvent, RunError, RunOptions, RunReport, SuiteNode, TestError,
    TestNode, TestState, acknowledged, block_on_local,
};
pub use gherkin_suite_engine::{
    GherkinEngine, Initializer, StepArgs, StepDefinitions, StepError, StepPattern, World,
};
pub use gherkin_suite_patterns::StepKeyword;
