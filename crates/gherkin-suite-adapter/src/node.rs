//! Suite and test records handed to the host.

use std::fmt;
use std::time::Duration;

use crate::error::RunError;

/// Failure recorded on a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError {
    /// Rendered failure message.
    pub message: String,
    /// Where the failure originated, when known.
    pub trace: Option<String>,
}

impl TestError {
    /// An error without a trace.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TestError {}

/// Pass/fail state of a test. Moves from `Passing` to `Failed` at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestState {
    /// No step has failed yet.
    #[default]
    Passing,
    /// A step failed; later steps are ignored.
    Failed(TestError),
}

/// One scenario as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestNode {
    name: String,
    state: TestState,
    time_elapsed: Option<Duration>,
}

impl TestNode {
    /// A passing test with no timing yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TestState::Passing,
            time_elapsed: None,
        }
    }

    /// Display name, suffixed when repeated.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether no step has failed.
    #[must_use]
    pub fn has_passed(&self) -> bool {
        matches!(self.state, TestState::Passing)
    }

    /// The first failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&TestError> {
        match &self.state {
            TestState::Passing => None,
            TestState::Failed(err) => Some(err),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TestState {
        &self.state
    }

    /// Time from case start to case finish, once finished.
    #[must_use]
    pub fn time_elapsed(&self) -> Option<Duration> {
        self.time_elapsed
    }

    /// Record a failure. Returns `false` and keeps the first error when the
    /// test has already failed.
    pub(crate) fn fail(&mut self, error: TestError) -> bool {
        if self.has_passed() {
            self.state = TestState::Failed(error);
            true
        } else {
            false
        }
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.time_elapsed = Some(elapsed);
    }
}

/// The suite produced by one feature run.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::SuiteNode;
///
/// let suite = SuiteNode::new("checkout");
/// assert_eq!(suite.name(), "checkout");
/// assert_eq!(suite.num_tests(), 0);
/// assert!(suite.error().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteNode {
    name: String,
    children: Vec<TestNode>,
    time_elapsed: Option<Duration>,
    error: Option<RunError>,
}

impl SuiteNode {
    /// An empty suite.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tests in the order their cases started.
    #[must_use]
    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    /// Look a test up by display name.
    #[must_use]
    pub fn test(&self, name: &str) -> Option<&TestNode> {
        self.children.iter().find(|t| t.name == name)
    }

    /// Time from suite start to suite end, once ended.
    #[must_use]
    pub fn time_elapsed(&self) -> Option<Duration> {
        self.time_elapsed
    }

    /// Run-level error, if the run failed or the tree could not be built.
    #[must_use]
    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    /// Number of tests.
    #[must_use]
    pub fn num_tests(&self) -> usize {
        self.children.len()
    }

    /// Number of passing tests.
    #[must_use]
    pub fn num_passed_tests(&self) -> usize {
        self.children.iter().filter(|t| t.has_passed()).count()
    }

    /// Number of failed tests.
    #[must_use]
    pub fn num_failed_tests(&self) -> usize {
        self.num_tests() - self.num_passed_tests()
    }

    pub(crate) fn push(&mut self, test: TestNode) -> usize {
        self.children.push(test);
        self.children.len() - 1
    }

    pub(crate) fn test_mut(&mut self, index: usize) -> Option<&mut TestNode> {
        self.children.get_mut(index)
    }

    pub(crate) fn set_time_elapsed(&mut self, elapsed: Duration) {
        self.time_elapsed = Some(elapsed);
    }

    /// Keep the first run-level error.
    pub(crate) fn record_error(&mut self, error: RunError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn replace_error(&mut self, error: RunError) {
        self.error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_latches_first_error() {
        let mut test = TestNode::new("S");
        assert!(test.fail(TestError::new("first")));
        assert!(!test.fail(TestError::new("second")));
        assert_eq!(test.error().map(|e| e.message.as_str()), Some("first"));
        assert!(!test.has_passed());
    }

    #[test]
    fn counts_passed_and_failed_children() {
        let mut suite = SuiteNode::new("F");
        suite.push(TestNode::new("a"));
        let idx = suite.push(TestNode::new("b"));
        if let Some(test) = suite.test_mut(idx) {
            test.fail(TestError::new("boom"));
        }
        assert_eq!(suite.num_tests(), 2);
        assert_eq!(suite.num_passed_tests(), 1);
        assert_eq!(suite.num_failed_tests(), 1);
        assert!(suite.test("b").is_some_and(|t| !t.has_passed()));
    }
}
