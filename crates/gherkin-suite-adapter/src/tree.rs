//! Projection of engine events onto the suite tree.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::engine::{DisplayData, EventListener};
use crate::error::{RunError, TreeMutationError};
use crate::event::{EngineEvent, SourceLocation, StepResult, StepStatus, TestCaseId, TestStepId};
use crate::host::{Acknowledgement, Host, HostEvent};
use crate::naming::NameRegistry;
use crate::node::{SuiteNode, TestError, TestNode};

struct OpenTest {
    index: usize,
    case: TestCaseId,
    started: Instant,
}

/// Builds a [`SuiteNode`] from engine events and notifies the host.
///
/// At most one test is open at a time: `CaseStarted` opens it and
/// `CaseFinished` closes it. While open, the first non-passing
/// `StepFinished` decides the test's error; later steps are ignored.
///
/// Faults while projecting an event are recorded on the suite and logged.
/// They never propagate to the emitting engine.
pub struct TreeBuilder<'h> {
    host: &'h dyn Host,
    suite: SuiteNode,
    names: NameRegistry,
    current: Option<OpenTest>,
    suite_started: Option<Instant>,
}

impl<'h> TreeBuilder<'h> {
    /// A builder for an empty suite named `suite_name`.
    #[must_use]
    pub fn new(suite_name: impl Into<String>, host: &'h dyn Host) -> Self {
        Self {
            host,
            suite: SuiteNode::new(suite_name),
            names: NameRegistry::new(),
            current: None,
            suite_started: None,
        }
    }

    /// The suite built so far.
    #[must_use]
    pub fn suite(&self) -> &SuiteNode {
        &self.suite
    }

    /// Finish building and hand the suite over.
    #[must_use]
    pub fn into_suite(self) -> SuiteNode {
        self.suite
    }

    /// The test currently open, if any.
    #[must_use]
    pub fn current_test(&self) -> Option<&TestNode> {
        self.current
            .as_ref()
            .and_then(|open| self.suite.children().get(open.index))
    }

    /// Whether the most recently created test passed.
    #[must_use]
    pub fn last_test_passed(&self) -> Option<bool> {
        self.suite.children().last().map(TestNode::has_passed)
    }

    /// Record the suite start time and notify `suiteStart`.
    ///
    /// The returned acknowledgement should be awaited before the first
    /// scenario runs.
    pub fn start_suite(&mut self) -> Acknowledgement {
        self.suite_started = Some(Instant::now());
        debug!(suite = self.suite.name(), "suite started");
        self.host.emit(HostEvent::SuiteStart(&self.suite))
    }

    /// Record the suite's elapsed time and notify `suiteEnd`.
    pub fn end_suite(&mut self) {
        if let Some(started) = self.suite_started.take() {
            self.suite.set_time_elapsed(started.elapsed());
        }
        debug!(
            suite = self.suite.name(),
            tests = self.suite.num_tests(),
            failed = self.suite.num_failed_tests(),
            "suite finished"
        );
        drop(self.host.emit(HostEvent::SuiteEnd(&self.suite)));
    }

    /// Attach a run failure to the suite and broadcast it.
    pub fn fail_run(&mut self, error: RunError) {
        drop(self.host.emit(HostEvent::Error(&error)));
        self.suite.replace_error(error);
    }

    /// Broadcast a fault recorded while projecting events.
    ///
    /// Returns whether the suite carried one.
    pub fn broadcast_recorded_fault(&self) -> bool {
        let Some(error) = self.suite.error() else {
            return false;
        };
        drop(self.host.emit(HostEvent::Error(error)));
        true
    }

    fn handle(
        &mut self,
        event: &EngineEvent,
        data: &dyn DisplayData,
    ) -> Result<(), TreeMutationError> {
        match event {
            EngineEvent::RunStarted => {
                self.names.reset();
                Ok(())
            }
            EngineEvent::CaseStarted { case, location } => self.open_test(*case, location, data),
            EngineEvent::CaseFinished { case } => self.close_test(*case),
            EngineEvent::StepFinished { step, result } => self.record_step(*step, result, data),
            EngineEvent::RunFinished { .. }
            | EngineEvent::CasePrepared { .. }
            | EngineEvent::StepAttachment { .. }
            | EngineEvent::StepStarted { .. } => Ok(()),
        }
    }

    fn open_test(
        &mut self,
        case: TestCaseId,
        location: &SourceLocation,
        data: &dyn DisplayData,
    ) -> Result<(), TreeMutationError> {
        if let Some(open) = self.current_test() {
            return Err(TreeMutationError::TestAlreadyOpen(open.name().to_owned()));
        }
        let display = data
            .case_display_data(location)
            .ok_or_else(|| TreeMutationError::UnknownTestCase(location.clone()))?;
        let name = self.names.disambiguate(&display.name);
        debug!(test = %name, %location, "test started");
        let index = self.suite.push(TestNode::new(name));
        self.current = Some(OpenTest {
            index,
            case,
            started: Instant::now(),
        });
        if let Some(test) = self.suite.children().get(index) {
            drop(self.host.emit(HostEvent::TestStart(test)));
        }
        Ok(())
    }

    fn close_test(&mut self, case: TestCaseId) -> Result<(), TreeMutationError> {
        let open = self
            .current
            .take()
            .ok_or(TreeMutationError::NoOpenTest("case-finished"))?;
        let test = self
            .suite
            .test_mut(open.index)
            .ok_or(TreeMutationError::NoOpenTest("case-finished"))?;
        test.finish(open.started.elapsed());
        debug!(test = test.name(), passed = test.has_passed(), "test finished");
        drop(self.host.emit(HostEvent::TestEnd(&*test)));
        if open.case == case {
            Ok(())
        } else {
            Err(TreeMutationError::CaseMismatch {
                open: open.case,
                finished: case,
            })
        }
    }

    fn record_step(
        &mut self,
        step: TestStepId,
        result: &StepResult,
        data: &dyn DisplayData,
    ) -> Result<(), TreeMutationError> {
        let index = self
            .current
            .as_ref()
            .map(|open| open.index)
            .ok_or(TreeMutationError::NoOpenTest("step-finished"))?;
        let test = self
            .suite
            .test_mut(index)
            .ok_or(TreeMutationError::NoOpenTest("step-finished"))?;
        if !test.has_passed() || result.status == StepStatus::Passed {
            return Ok(());
        }
        let label = data
            .step_display_data(step)
            .ok_or(TreeMutationError::UnknownTestStep(step))?
            .label();
        trace!(step = %label, status = %result.status, "step did not pass");
        test.fail(step_error(&label, result));
        Ok(())
    }
}

fn step_error(label: &str, result: &StepResult) -> TestError {
    let exception = result.exception.as_ref();
    let trace = exception.and_then(|e| e.trace.clone());
    let message = match (result.status, exception) {
        (StepStatus::Failed, Some(e)) => format!("\"{label}\" failed:\n{}", e.message),
        (StepStatus::Failed, None) => format!("\"{label}\" failed"),
        (StepStatus::Ambiguous, Some(e)) => e.message.clone(),
        (StepStatus::Ambiguous, None) => format!("\"{label}\" matches more than one step definition"),
        (StepStatus::Undefined, _) => {
            format!("\"{label}\" does not have a matching step definition")
        }
        (StepStatus::Skipped | StepStatus::Passed, _) => format!("\"{label}\" was skipped"),
    };
    TestError { message, trace }
}

impl EventListener for TreeBuilder<'_> {
    fn on_event(&mut self, event: &EngineEvent, data: &dyn DisplayData) {
        trace!(event = event.kind(), "engine event");
        if let Err(err) = self.handle(event, data) {
            warn!(event = event.kind(), error = %err, "could not update suite tree");
            self.suite.record_error(RunError::TreeMutation(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StepException;
    use crate::test_utils::{FixedDisplayData, RecordingHost};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn data() -> FixedDisplayData {
        FixedDisplayData::new()
            .with_case(1, "A scenario")
            .with_case(5, "A scenario")
            .with_step(0, 0, "Given", "x = 5")
            .with_step(0, 1, "And", "y = 5")
            .with_step(0, 2, "Then", "z = 5")
    }

    fn started(case: usize, line: usize) -> EngineEvent {
        EngineEvent::CaseStarted {
            case: TestCaseId(case),
            location: SourceLocation::new("/feature", line),
        }
    }

    fn finished(case: usize) -> EngineEvent {
        EngineEvent::CaseFinished {
            case: TestCaseId(case),
        }
    }

    fn step(index: usize, status: StepStatus, message: Option<&str>) -> EngineEvent {
        EngineEvent::StepFinished {
            step: TestStepId {
                case: TestCaseId(0),
                index,
            },
            result: StepResult::new(status, message.map(StepException::new), Duration::ZERO),
        }
    }

    #[rstest]
    fn passing_steps_keep_test_passed(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        for event in [
            EngineEvent::RunStarted,
            started(0, 1),
            step(0, StepStatus::Passed, None),
            step(1, StepStatus::Passed, None),
            finished(0),
        ] {
            tree.on_event(&event, &data);
        }
        let suite = tree.into_suite();
        assert_eq!(suite.num_tests(), 1);
        assert!(suite.children().iter().all(TestNode::has_passed));
        assert!(suite.error().is_none());
        assert_eq!(host.names(), vec!["testStart", "testEnd"]);
    }

    #[rstest]
    fn first_failure_wins(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        for event in [
            started(0, 1),
            step(0, StepStatus::Passed, None),
            step(1, StepStatus::Failed, Some("This fails")),
            step(2, StepStatus::Undefined, None),
            finished(0),
        ] {
            tree.on_event(&event, &data);
        }
        let suite = tree.into_suite();
        let error = suite.children().first().and_then(TestNode::error);
        assert_eq!(
            error.map(|e| e.message.as_str()),
            Some("\"And y = 5\" failed:\nThis fails")
        );
    }

    #[rstest]
    fn undefined_step_is_reported(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&step(0, StepStatus::Undefined, None), &data);
        tree.on_event(&finished(0), &data);
        let suite = tree.into_suite();
        assert_eq!(
            suite.children().first().and_then(TestNode::error).map(ToString::to_string),
            Some("\"Given x = 5\" does not have a matching step definition".to_owned())
        );
        assert_eq!(suite.num_failed_tests(), 1);
    }

    #[rstest]
    fn ambiguous_message_is_used_verbatim(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&step(0, StepStatus::Ambiguous, Some("two definitions")), &data);
        let test = tree.current_test().cloned();
        assert_eq!(
            test.and_then(|t| t.error().map(|e| e.message.clone())),
            Some("two definitions".to_owned())
        );
    }

    #[rstest]
    fn repeated_names_are_suffixed_and_reset_per_run(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        for event in [
            EngineEvent::RunStarted,
            started(0, 1),
            finished(0),
            started(1, 5),
            finished(1),
            EngineEvent::RunStarted,
            started(2, 1),
            finished(2),
        ] {
            tree.on_event(&event, &data);
        }
        let names: Vec<&str> = tree.suite().children().iter().map(TestNode::name).collect();
        assert_eq!(names, vec!["A scenario", "A scenario (2)", "A scenario"]);
    }

    #[rstest]
    fn zero_step_scenario_passes(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&finished(0), &data);
        assert_eq!(tree.last_test_passed(), Some(true));
        assert!(tree.suite().children().first().and_then(TestNode::time_elapsed).is_some());
    }

    #[rstest]
    fn unknown_case_is_recorded_not_propagated(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 99), &data);
        tree.on_event(&finished(0), &data);
        let suite = tree.into_suite();
        assert_eq!(suite.num_tests(), 0);
        assert!(matches!(
            suite.error(),
            Some(RunError::TreeMutation(TreeMutationError::UnknownTestCase(_)))
        ));
    }

    #[rstest]
    fn overlapping_cases_are_a_fault(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&started(1, 5), &data);
        assert_eq!(tree.suite().num_tests(), 1);
        assert!(matches!(
            tree.suite().error(),
            Some(RunError::TreeMutation(TreeMutationError::TestAlreadyOpen(name))) if name == "A scenario"
        ));
    }

    #[rstest]
    fn finishing_another_case_closes_the_open_test_and_records_a_fault(
        data: FixedDisplayData,
    ) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&finished(3), &data);
        assert!(tree.current_test().is_none());
        assert!(matches!(
            tree.suite().error(),
            Some(RunError::TreeMutation(TreeMutationError::CaseMismatch {
                open: TestCaseId(0),
                finished: TestCaseId(3),
            }))
        ));
        assert_eq!(host.names(), vec!["testStart", "testEnd"]);
    }

    #[rstest]
    fn recorded_fault_is_broadcast_on_request(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        assert!(!tree.broadcast_recorded_fault());
        tree.on_event(&finished(0), &data);
        assert!(tree.broadcast_recorded_fault());
        let last = host.events().pop();
        assert_eq!(last.as_ref().map(|r| r.name), Some("error"));
        assert!(last.is_some_and(|r| r.subject.contains("while no test was open")));
    }

    #[rstest]
    fn suite_lifecycle_reaches_host(data: FixedDisplayData) {
        let host = RecordingHost::new();
        let mut tree = TreeBuilder::new("F", &host);
        drop(tree.start_suite());
        tree.on_event(&started(0, 1), &data);
        tree.on_event(&finished(0), &data);
        tree.end_suite();
        assert_eq!(
            host.names(),
            vec!["suiteStart", "testStart", "testEnd", "suiteEnd"]
        );
        assert!(tree.suite().time_elapsed().is_some());
    }
}
