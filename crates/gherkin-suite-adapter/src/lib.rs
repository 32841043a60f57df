//! Event-to-tree adapter between a BDD scenario engine and a host test
//! framework.
//!
//! A scenario engine reports a flat stream of lifecycle events about test
//! cases and steps. A host framework expects a suite of named tests that
//! start, pass or fail, and end. This crate bridges the two:
//!
//! - [`NameRegistry`] keeps repeated scenario names distinct within a run.
//! - [`TreeBuilder`] listens to [`EngineEvent`]s and maintains the
//!   [`SuiteNode`], notifying the [`Host`] as tests open and close.
//! - [`RunOrchestrator`] sequences compilation, support code, global hooks and
//!   the scenarios themselves against any [`ScenarioEngine`].

mod engine;
mod error;
mod event;
mod host;
mod naming;
mod node;
mod orchestrator;
mod runtime;
mod tree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use engine::{
    CaseDisplayData, DisplayData, EventListener, HookGroup, ScenarioEngine, StepDisplayData,
    WorldParameters,
};
pub use error::{EngineError, RunError, TreeMutationError};
pub use event::{
    EngineEvent, SourceLocation, StepException, StepResult, StepStatus, TestCaseId, TestStepId,
};
pub use host::{Acknowledgement, Host, HostEvent, acknowledged};
pub use naming::NameRegistry;
pub use node::{SuiteNode, TestError, TestNode, TestState};
pub use orchestrator::{Initializer, RunOptions, RunOrchestrator, RunReport, RunRequest};
pub use runtime::block_on_local;
pub use tree::TreeBuilder;
