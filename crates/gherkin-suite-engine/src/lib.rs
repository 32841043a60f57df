//! Reference scenario engine for gherkin-suite.
//!
//! [`GherkinEngine`] compiles feature text with the `gherkin` parser into
//! [`Pickle`]s and runs them against step definitions registered through
//! [`StepDefinitions`]. It reports progress to the adapter as lifecycle
//! events and answers display-data queries through its
//! [`EventDataCollector`].

mod collector;
mod engine;
mod pickle;
mod step;
mod support;
mod world;

pub use collector::EventDataCollector;
pub use engine::GherkinEngine;
pub use pickle::{Pickle, PickleStep, compile_feature};
pub use step::{StepArgs, StepError, panic_message};
pub use support::{
    DefinitionLocation, StepDefinitions, StepPattern, SupportCodeError, SupportCodeLibrary,
};
pub use world::World;

/// Step-definition initializer accepted by [`GherkinEngine`] runs.
pub type Initializer = gherkin_suite_adapter::Initializer<StepDefinitions>;
