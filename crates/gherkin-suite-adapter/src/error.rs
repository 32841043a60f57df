//! Error types raised by the engine boundary and by a feature run.

use thiserror::Error;

use crate::engine::HookGroup;
use crate::event::{SourceLocation, TestCaseId, TestStepId};

/// Failure reported by a [`ScenarioEngine`](crate::ScenarioEngine).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    /// The feature source could not be parsed.
    #[error("failed to parse feature source: {0}")]
    Parse(String),
    /// A step definition or hook registration was invalid.
    #[error("invalid support code: {0}")]
    SupportCode(String),
    /// A global hook failed.
    #[error("{hook} failed: {message}")]
    Hook {
        /// Description of the failing hook.
        hook: String,
        /// Failure message.
        message: String,
    },
    /// The engine could not continue executing a test case.
    #[error("{0}")]
    Runtime(String),
}

/// Fault raised while projecting an event onto the test tree.
///
/// These never reach the engine: the [`TreeBuilder`](crate::TreeBuilder)
/// records them on the suite and keeps listening.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeMutationError {
    /// No display data exists for the started case.
    #[error("no test case is known at {0}")]
    UnknownTestCase(SourceLocation),
    /// No display data exists for the finished step.
    #[error("no step {} is known in test case {}", .0.index, .0.case.0)]
    UnknownTestStep(TestStepId),
    /// A case finished or a step reported while no test was open.
    #[error("received {0} while no test was open")]
    NoOpenTest(&'static str),
    /// A case started before the previous one finished.
    #[error("test case started while `{0}` was still open")]
    TestAlreadyOpen(String),
    /// A case finished while a different case was open.
    #[error("test case {} finished while test case {} was open", .finished.0, .open.0)]
    CaseMismatch {
        /// The case that was open.
        open: TestCaseId,
        /// The case reported as finished.
        finished: TestCaseId,
    },
}

/// Why a feature run failed.
///
/// Step failures are not errors: they are recorded on the affected
/// [`TestNode`](crate::TestNode). A `RunError` means the run itself could not
/// complete normally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunError {
    /// The feature source did not compile; no tests were created.
    #[error(transparent)]
    Compile(EngineError),
    /// Support code could not be finalized.
    #[error(transparent)]
    SupportCode(EngineError),
    /// A global hook group failed.
    #[error("{group} hooks failed: {source}")]
    Hook {
        /// Which group failed.
        group: HookGroup,
        /// Engine detail.
        source: EngineError,
    },
    /// The engine failed unexpectedly while running a scenario.
    #[error("scenario {index} could not run: {source}")]
    ScenarioRuntime {
        /// Zero-based position of the scenario in execution order.
        index: usize,
        /// Engine detail.
        source: EngineError,
    },
    /// The adapter could not project an event onto the tree.
    #[error(transparent)]
    TreeMutation(#[from] TreeMutationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_errors_name_the_group() {
        let err = RunError::Hook {
            group: HookGroup::BeforeAll,
            source: EngineError::Hook {
                hook: "BeforeAll hook (steps.rs:3)".into(),
                message: "no database".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "BeforeAll hooks failed: BeforeAll hook (steps.rs:3) failed: no database"
        );
    }

    #[test]
    fn compile_errors_are_transparent() {
        let err = RunError::Compile(EngineError::Parse("line 1: bad".into()));
        assert_eq!(err.to_string(), "failed to parse feature source: line 1: bad");
    }

    #[test]
    fn unknown_step_names_its_position() {
        let err = TreeMutationError::UnknownTestStep(TestStepId {
            case: TestCaseId(2),
            index: 5,
        });
        assert_eq!(err.to_string(), "no step 5 is known in test case 2");
    }
}
