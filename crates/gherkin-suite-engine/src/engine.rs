//! The scenario engine: runs pickles against a support code library.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use gherkin_suite_adapter::{
    DisplayData, EngineError, EngineEvent, EventListener, HookGroup, ScenarioEngine,
    StepException, StepResult, StepStatus, TestCaseId, TestStepId, WorldParameters,
};

use crate::collector::EventDataCollector;
use crate::pickle::{Pickle, PickleStep, compile_feature};
use crate::step::{StepArgs, StepError, panic_message};
use crate::support::{DefinitionLocation, StepDefinition, StepDefinitions, SupportCodeLibrary};
use crate::world::World;

/// Gherkin-backed [`ScenarioEngine`].
///
/// Each test case gets a fresh [`World`]. `Before` hooks and steps are
/// skipped once anything in the case has failed; `After` hooks always run.
#[derive(Debug, Default)]
pub struct GherkinEngine {
    collector: EventDataCollector,
}

impl GherkinEngine {
    /// An engine with nothing compiled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Display data of the cases compiled so far.
    #[must_use]
    pub fn collector(&self) -> &EventDataCollector {
        &self.collector
    }
}

impl ScenarioEngine for GherkinEngine {
    type TestCase = Pickle;
    type SupportCode = StepDefinitions;
    type Library = SupportCodeLibrary;

    async fn compile(&mut self, source: &str, uri: &str) -> Result<Vec<Pickle>, EngineError> {
        let pickles = compile_feature(source, uri)?;
        log::debug!("compiled {} test cases from {uri}", pickles.len());
        self.collector.record_pickles(&pickles);
        Ok(pickles)
    }

    fn reset_support_code(
        &mut self,
        base_uri: &str,
        parameters: WorldParameters,
    ) -> StepDefinitions {
        StepDefinitions::new(base_uri, parameters)
    }

    fn finalize_support_code(
        &mut self,
        code: StepDefinitions,
    ) -> Result<SupportCodeLibrary, EngineError> {
        code.finalize()
            .map_err(|err| EngineError::SupportCode(err.to_string()))
    }

    async fn run_hook_group(
        &mut self,
        library: &SupportCodeLibrary,
        group: HookGroup,
        _listener: &mut dyn EventListener,
    ) -> Result<(), EngineError> {
        for hook in library.global_hooks(group == HookGroup::BeforeAll) {
            log::debug!("running {group} hook at {}", hook.location);
            invoke(|| (hook.body)()).map_err(|message| EngineError::Hook {
                hook: format!("{group} hook ({})", hook.location),
                message,
            })?;
        }
        Ok(())
    }

    async fn run_test_case(
        &mut self,
        library: &SupportCodeLibrary,
        case: &Pickle,
        listener: &mut dyn EventListener,
    ) -> Result<(), EngineError> {
        let mut world = panic::catch_unwind(AssertUnwindSafe(|| library.new_world()))
            .map_err(|payload| {
                EngineError::Runtime(format!(
                    "world constructor panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })?;
        self.collector.prepare(case, library);
        let data: &dyn DisplayData = &self.collector;
        listener.on_event(&EngineEvent::CasePrepared { case: case.id }, data);
        listener.on_event(
            &EngineEvent::CaseStarted {
                case: case.id,
                location: case.location.clone(),
            },
            data,
        );

        let mut run = CaseRun {
            case: case.id,
            index: 0,
            failed: false,
            listener,
            data,
        };
        for hook in library.before_hooks() {
            run.execute(true, || run_hook(hook.location, hook.body, &mut world));
        }
        for step in &case.steps {
            run.execute(true, || run_step(library, step, &mut world));
        }
        for hook in library.after_hooks() {
            run.execute(false, || run_hook(hook.location, hook.body, &mut world));
        }

        run.finish();
        Ok(())
    }

    fn display_data(&self) -> &dyn DisplayData {
        &self.collector
    }
}

/// Emits the step events of one test case.
struct CaseRun<'a, 'l> {
    case: TestCaseId,
    index: usize,
    failed: bool,
    listener: &'a mut (dyn EventListener + 'l),
    data: &'a dyn DisplayData,
}

impl CaseRun<'_, '_> {
    fn execute(&mut self, skippable: bool, outcome: impl FnOnce() -> StepResult) {
        let step = TestStepId {
            case: self.case,
            index: self.index,
        };
        self.index += 1;
        self.listener
            .on_event(&EngineEvent::StepStarted { step }, self.data);
        let result = if self.failed && skippable {
            StepResult::new(StepStatus::Skipped, None, Duration::ZERO)
        } else {
            outcome()
        };
        if result.status != StepStatus::Passed {
            self.failed = true;
        }
        log::debug!(
            "step {} of case {} {}",
            step.index,
            step.case.0,
            result.status
        );
        self.listener
            .on_event(&EngineEvent::StepFinished { step, result }, self.data);
    }

    fn finish(self) {
        self.listener
            .on_event(&EngineEvent::CaseFinished { case: self.case }, self.data);
    }
}

/// Run `body`, turning an `Err` or a panic into a message.
fn invoke(body: impl FnOnce() -> Result<(), StepError>) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn run_hook(
    location: DefinitionLocation,
    body: &dyn Fn(&mut World) -> Result<(), StepError>,
    world: &mut World,
) -> StepResult {
    let started = Instant::now();
    match invoke(|| body(world)) {
        Ok(()) => StepResult::passed(started.elapsed()),
        Err(message) => failed(message, location, started),
    }
}

fn run_step(library: &SupportCodeLibrary, step: &PickleStep, world: &mut World) -> StepResult {
    let started = Instant::now();
    let candidates = library.matching(&step.text);
    match candidates.as_slice() {
        [] => {
            log::debug!("no step definition matches `{}`", step.text);
            StepResult::new(StepStatus::Undefined, None, started.elapsed())
        }
        [(definition, captures)] => {
            log::debug!(
                "`{}` matched {} `{}`",
                step.text,
                definition.keyword(),
                definition.pattern()
            );
            let args = StepArgs::new(
                &step.text,
                captures,
                step.docstring.as_deref(),
                step.table.as_deref(),
            );
            match invoke(|| definition.invoke(world, &args)) {
                Ok(()) => StepResult::passed(started.elapsed()),
                Err(message) => failed(message, definition.location(), started),
            }
        }
        many => {
            log::warn!("`{}` matches {} step definitions", step.text, many.len());
            let exception = StepException::new(ambiguity_message(many));
            StepResult::new(StepStatus::Ambiguous, Some(exception), started.elapsed())
        }
    }
}

fn failed(message: String, location: DefinitionLocation, started: Instant) -> StepResult {
    let exception = StepException::new(message).with_trace(location.to_string());
    StepResult::new(StepStatus::Failed, Some(exception), started.elapsed())
}

fn ambiguity_message(matches: &[(&StepDefinition, Vec<String>)]) -> String {
    let lines: Vec<String> = matches
        .iter()
        .map(|(definition, _)| format!("  {} - {}", definition.pattern(), definition.location()))
        .collect();
    format!("Multiple step definitions match:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_and_panics_become_messages() {
        assert_eq!(invoke(|| Ok(())), Ok(()));
        assert_eq!(invoke(|| Err("This fails".into())), Err("This fails".to_owned()));
        assert_eq!(invoke(|| panic!("boom")), Err("boom".to_owned()));
    }

    #[test]
    fn failures_carry_the_definition_site() {
        let location = DefinitionLocation::caller();
        let result = failed("nope".into(), location, Instant::now());
        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(
            result.exception.and_then(|e| e.trace),
            Some(location.to_string())
        );
    }
}
