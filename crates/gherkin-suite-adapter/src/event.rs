//! Lifecycle events emitted by a scenario engine.

use std::fmt;
use std::time::Duration;

/// Identifies one compiled test case (pickle) within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestCaseId(pub usize);

/// Identifies one step of a test case, hooks included, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestStepId {
    /// Owning test case.
    pub case: TestCaseId,
    /// Zero-based position among the case's executable steps.
    pub index: usize,
}

/// Where a scenario was declared in its feature source.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::SourceLocation;
///
/// let location = SourceLocation::new("/feature", 3);
/// assert_eq!(location.to_string(), "/feature:3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Uri the source was compiled under.
    pub uri: String,
    /// One-based line of the scenario (or examples row) keyword.
    pub line: usize,
}

impl SourceLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(uri: impl Into<String>, line: usize) -> Self {
        Self {
            uri: uri.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uri, self.line)
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step definition completed normally.
    Passed,
    /// The step definition failed or panicked.
    Failed,
    /// No step definition matched the step text.
    Undefined,
    /// More than one step definition matched the step text.
    Ambiguous,
    /// The step was not run because an earlier step did not pass.
    Skipped,
}

impl StepStatus {
    /// Lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Undefined => "undefined",
            Self::Ambiguous => "ambiguous",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail attached to a non-passing step result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepException {
    /// Human-readable failure message.
    pub message: String,
    /// Where the failure originated, when the engine knows.
    pub trace: Option<String>,
}

impl StepException {
    /// Exception carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }

    /// Attach the originating trace.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// Result reported when a step finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Step outcome.
    pub status: StepStatus,
    /// Failure detail for failed and ambiguous steps.
    pub exception: Option<StepException>,
    /// Time spent in the step.
    pub duration: Duration,
}

impl StepResult {
    /// A passing result.
    #[must_use]
    pub fn passed(duration: Duration) -> Self {
        Self {
            status: StepStatus::Passed,
            exception: None,
            duration,
        }
    }

    /// A result with the given status and optional exception.
    #[must_use]
    pub fn new(status: StepStatus, exception: Option<StepException>, duration: Duration) -> Self {
        Self {
            status,
            exception,
            duration,
        }
    }
}

/// Engine lifecycle event.
///
/// Only `RunStarted`, `CaseStarted`, `CaseFinished` and `StepFinished` change
/// the test tree; the rest are observed and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineEvent {
    /// A run is about to execute its first hook or scenario.
    RunStarted,
    /// The run has completed.
    RunFinished {
        /// Whether every scenario passed and no run-level error occurred.
        success: bool,
    },
    /// A test case has been prepared for execution.
    CasePrepared {
        /// The case.
        case: TestCaseId,
    },
    /// A test case started.
    CaseStarted {
        /// The case.
        case: TestCaseId,
        /// Where the scenario was declared.
        location: SourceLocation,
    },
    /// A test case finished.
    CaseFinished {
        /// The case.
        case: TestCaseId,
    },
    /// A step attached data such as a log line or screenshot.
    StepAttachment {
        /// The step.
        step: TestStepId,
        /// Media type of the payload.
        media_type: String,
        /// Payload.
        body: String,
    },
    /// A step started.
    StepStarted {
        /// The step.
        step: TestStepId,
    },
    /// A step finished.
    StepFinished {
        /// The step.
        step: TestStepId,
        /// Its outcome.
        result: StepResult,
    },
}

impl EngineEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted => "run-started",
            Self::RunFinished { .. } => "run-finished",
            Self::CasePrepared { .. } => "case-prepared",
            Self::CaseStarted { .. } => "case-started",
            Self::CaseFinished { .. } => "case-finished",
            Self::StepAttachment { .. } => "step-attachment",
            Self::StepStarted { .. } => "step-started",
            Self::StepFinished { .. } => "step-finished",
        }
    }
}
