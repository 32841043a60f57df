//! Test doubles for the host and engine boundaries.
//!
//! Enabled for this crate's tests and, through the `test-support` feature,
//! for downstream crates.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::engine::{
    CaseDisplayData, DisplayData, EventListener, HookGroup, ScenarioEngine, StepDisplayData,
    WorldParameters,
};
use crate::error::EngineError;
use crate::event::{
    EngineEvent, SourceLocation, StepException, StepResult, StepStatus, TestCaseId, TestStepId,
};
use crate::host::{Acknowledgement, Host, HostEvent};

/// One notification as seen by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// Wire name, e.g. `testStart`.
    pub name: &'static str,
    /// Suite or test name, or the rendered run error.
    pub subject: String,
    /// Whether the test had passed at the time of notification.
    pub passed: Option<bool>,
}

/// Host that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: RefCell<Vec<Recorded>>,
    acknowledged: Rc<Cell<usize>>,
}

impl RecordingHost {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Recorded> {
        self.events.borrow().clone()
    }

    /// Wire names recorded so far.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(|r| r.name).collect()
    }

    /// How many acknowledgements were polled to completion.
    #[must_use]
    pub fn acknowledged(&self) -> usize {
        self.acknowledged.get()
    }
}

impl Host for RecordingHost {
    fn emit(&self, event: HostEvent<'_>) -> Acknowledgement {
        let (subject, passed) = match event {
            HostEvent::SuiteStart(suite) | HostEvent::SuiteEnd(suite) => {
                (suite.name().to_owned(), None)
            }
            HostEvent::TestStart(test) | HostEvent::TestEnd(test) => {
                (test.name().to_owned(), Some(test.has_passed()))
            }
            HostEvent::Error(err) => (err.to_string(), None),
        };
        self.events.borrow_mut().push(Recorded {
            name: event.name(),
            subject,
            passed,
        });
        let counter = Rc::clone(&self.acknowledged);
        Box::pin(async move {
            counter.set(counter.get() + 1);
        })
    }
}

/// Display data backed by fixed tables.
#[derive(Debug, Default, Clone)]
pub struct FixedDisplayData {
    cases: HashMap<usize, String>,
    steps: HashMap<(usize, usize), StepDisplayData>,
}

impl FixedDisplayData {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the case declared at `line`.
    #[must_use]
    pub fn with_case(mut self, line: usize, name: &str) -> Self {
        self.cases.insert(line, name.to_owned());
        self
    }

    /// Describe step `index` of `case`.
    #[must_use]
    pub fn with_step(mut self, case: usize, index: usize, keyword: &str, text: &str) -> Self {
        self.steps
            .insert((case, index), StepDisplayData::new(keyword, text));
        self
    }
}

impl DisplayData for FixedDisplayData {
    fn case_display_data(&self, location: &SourceLocation) -> Option<CaseDisplayData> {
        self.cases
            .get(&location.line)
            .map(|name| CaseDisplayData { name: name.clone() })
    }

    fn step_display_data(&self, step: TestStepId) -> Option<StepDisplayData> {
        self.steps.get(&(step.case.0, step.index)).cloned()
    }
}

/// A scripted step: what it says and how it ends.
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    /// Keyword as written.
    pub keyword: String,
    /// Step text.
    pub text: String,
    /// Reported status.
    pub status: StepStatus,
    /// Exception message for non-passing steps.
    pub message: Option<String>,
}

impl ScriptedStep {
    /// A passing step.
    #[must_use]
    pub fn passing(keyword: &str, text: &str) -> Self {
        Self {
            keyword: keyword.to_owned(),
            text: text.to_owned(),
            status: StepStatus::Passed,
            message: None,
        }
    }

    /// A step ending with `status` and `message`.
    #[must_use]
    pub fn ending(keyword: &str, text: &str, status: StepStatus, message: &str) -> Self {
        Self {
            keyword: keyword.to_owned(),
            text: text.to_owned(),
            status,
            message: Some(message.to_owned()),
        }
    }
}

/// A scripted test case.
#[derive(Debug, Clone)]
pub struct ScriptedCase {
    /// Scenario name.
    pub name: String,
    /// Steps in order.
    pub steps: Vec<ScriptedStep>,
    /// When set, the engine fails before running the case.
    pub runtime_error: Option<String>,
    /// Report `CaseFinished` twice.
    pub finish_twice: bool,
}

impl ScriptedCase {
    /// A case with the given steps.
    #[must_use]
    pub fn new(name: &str, steps: Vec<ScriptedStep>) -> Self {
        Self {
            name: name.to_owned(),
            steps,
            runtime_error: None,
            finish_twice: false,
        }
    }

    /// A case the engine cannot execute.
    #[must_use]
    pub fn broken(name: &str, message: &str) -> Self {
        Self {
            name: name.to_owned(),
            steps: Vec::new(),
            runtime_error: Some(message.to_owned()),
            finish_twice: false,
        }
    }

    /// Make the engine report this case finished a second time.
    #[must_use]
    pub fn finished_twice(mut self) -> Self {
        self.finish_twice = true;
        self
    }
}

/// Registrations collected by [`ScriptedEngine`] initializers.
#[derive(Debug, Default)]
pub struct ScriptedSupportCode {
    /// Registered step names.
    pub steps: Vec<String>,
    /// Parameters passed to `reset_support_code`.
    pub parameters: WorldParameters,
    /// Base uri passed to `reset_support_code`.
    pub base_uri: String,
}

/// Engine replaying scripted cases.
///
/// Each case is declared on line `index + 1` of `/feature`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    cases: Vec<ScriptedCase>,
    compile_error: Option<String>,
    failing_hooks: Vec<HookGroup>,
    data: FixedDisplayData,
    /// Engine entry points in call order.
    pub calls: Vec<String>,
}

impl ScriptedEngine {
    /// Engine compiling any source into `cases`.
    #[must_use]
    pub fn new(cases: Vec<ScriptedCase>) -> Self {
        Self {
            cases,
            ..Self::default()
        }
    }

    /// Engine whose compilation fails with `message`.
    #[must_use]
    pub fn failing_compile(message: &str) -> Self {
        Self {
            compile_error: Some(message.to_owned()),
            ..Self::default()
        }
    }

    /// Make a hook group fail.
    #[must_use]
    pub fn with_failing_hooks(mut self, group: HookGroup) -> Self {
        self.failing_hooks.push(group);
        self
    }
}

impl ScenarioEngine for ScriptedEngine {
    type TestCase = (TestCaseId, ScriptedCase);
    type SupportCode = ScriptedSupportCode;
    type Library = Vec<String>;

    async fn compile(
        &mut self,
        _source: &str,
        _uri: &str,
    ) -> Result<Vec<Self::TestCase>, EngineError> {
        self.calls.push("compile".into());
        if let Some(message) = &self.compile_error {
            return Err(EngineError::Parse(message.clone()));
        }
        let mut data = FixedDisplayData::new();
        for (i, case) in self.cases.iter().enumerate() {
            data = data.with_case(i + 1, &case.name);
            for (j, step) in case.steps.iter().enumerate() {
                data = data.with_step(i, j, &step.keyword, &step.text);
            }
        }
        self.data = data;
        Ok(self
            .cases
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, case)| (TestCaseId(i), case))
            .collect())
    }

    fn reset_support_code(
        &mut self,
        base_uri: &str,
        parameters: WorldParameters,
    ) -> Self::SupportCode {
        self.calls.push("reset_support_code".into());
        ScriptedSupportCode {
            steps: Vec::new(),
            parameters,
            base_uri: base_uri.to_owned(),
        }
    }

    fn finalize_support_code(
        &mut self,
        code: Self::SupportCode,
    ) -> Result<Self::Library, EngineError> {
        self.calls.push("finalize_support_code".into());
        Ok(code.steps)
    }

    async fn run_hook_group(
        &mut self,
        _library: &Self::Library,
        group: HookGroup,
        _listener: &mut dyn EventListener,
    ) -> Result<(), EngineError> {
        self.calls.push(format!("hooks:{group}"));
        if self.failing_hooks.contains(&group) {
            return Err(EngineError::Hook {
                hook: format!("{group} hook"),
                message: "scripted failure".into(),
            });
        }
        Ok(())
    }

    async fn run_test_case(
        &mut self,
        _library: &Self::Library,
        case: &Self::TestCase,
        listener: &mut dyn EventListener,
    ) -> Result<(), EngineError> {
        let (id, scripted) = case;
        self.calls.push(format!("case:{}", scripted.name));
        if let Some(message) = &scripted.runtime_error {
            return Err(EngineError::Runtime(message.clone()));
        }
        listener.on_event(&EngineEvent::CasePrepared { case: *id }, &self.data);
        listener.on_event(
            &EngineEvent::CaseStarted {
                case: *id,
                location: SourceLocation::new("/feature", id.0 + 1),
            },
            &self.data,
        );
        for (index, step) in scripted.steps.iter().enumerate() {
            let step_id = TestStepId { case: *id, index };
            listener.on_event(&EngineEvent::StepStarted { step: step_id }, &self.data);
            let result = StepResult::new(
                step.status,
                step.message.as_deref().map(StepException::new),
                Duration::ZERO,
            );
            listener.on_event(
                &EngineEvent::StepFinished {
                    step: step_id,
                    result,
                },
                &self.data,
            );
        }
        listener.on_event(&EngineEvent::CaseFinished { case: *id }, &self.data);
        if scripted.finish_twice {
            listener.on_event(&EngineEvent::CaseFinished { case: *id }, &self.data);
        }
        Ok(())
    }

    fn display_data(&self) -> &dyn DisplayData {
        &self.data
    }
}
