//! Boundary between the adapter and a scenario engine.
//!
//! The adapter never parses feature text or matches steps itself. It drives
//! an engine through [`ScenarioEngine`] and receives lifecycle events through
//! [`EventListener`], resolving names through [`DisplayData`].

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::EngineError;
use crate::event::{EngineEvent, SourceLocation, TestStepId};

/// Name of a scenario as the host should display it, before
/// disambiguation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDisplayData {
    /// Scenario name as written in the feature.
    pub name: String,
}

/// Keyword and text of a step as written in the feature.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::StepDisplayData;
///
/// let step = StepDisplayData::new("And", "y = 5");
/// assert_eq!(step.label(), "And y = 5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDisplayData {
    /// Keyword as written, without trailing whitespace.
    pub keyword: String,
    /// Step text after the keyword.
    pub text: String,
}

impl StepDisplayData {
    /// Creates display data for one step.
    #[must_use]
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
        }
    }

    /// `"<keyword> <text>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.keyword, self.text)
    }
}

/// Lookups the adapter performs while projecting events.
pub trait DisplayData {
    /// Display data of the case declared at `location`.
    fn case_display_data(&self, location: &SourceLocation) -> Option<CaseDisplayData>;

    /// Display data of one executable step.
    fn step_display_data(&self, step: TestStepId) -> Option<StepDisplayData>;
}

/// Receives engine events in emission order.
pub trait EventListener {
    /// Handle one event. Must not fail: listeners record their own faults.
    fn on_event(&mut self, event: &EngineEvent, data: &dyn DisplayData);
}

/// Global hook groups run once per feature run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookGroup {
    /// Runs before the first scenario.
    BeforeAll,
    /// Runs after the last scenario.
    AfterAll,
}

impl fmt::Display for HookGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeAll => "BeforeAll",
            Self::AfterAll => "AfterAll",
        })
    }
}

/// Parameters copied onto every scenario's world.
///
/// Carries the externally supplied remote context, if any. The remote is
/// opaque to the adapter and retrieved by type.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::WorldParameters;
///
/// let params = WorldParameters::with_remote(String::from("session-1"));
/// assert_eq!(params.remote::<String>().map(String::as_str), Some("session-1"));
/// assert!(params.remote::<u32>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct WorldParameters {
    remote: Option<Arc<dyn Any + Send + Sync>>,
}

impl WorldParameters {
    /// Parameters carrying `remote`.
    #[must_use]
    pub fn with_remote<T: Any + Send + Sync>(remote: T) -> Self {
        Self {
            remote: Some(Arc::new(remote)),
        }
    }

    /// Parameters sharing an existing remote handle.
    #[must_use]
    pub fn from_handle(remote: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        Self { remote }
    }

    /// The remote, if present and of type `T`.
    #[must_use]
    pub fn remote<T: Any>(&self) -> Option<&T> {
        self.remote.as_deref().and_then(|r| r.downcast_ref::<T>())
    }

    /// The untyped remote handle.
    #[must_use]
    pub fn remote_handle(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.remote.clone()
    }
}

impl fmt::Debug for WorldParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldParameters")
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

/// A scenario engine driven by [`RunOrchestrator`](crate::RunOrchestrator).
///
/// One engine value serves one run at a time. Support code is rebuilt for
/// every run: [`reset_support_code`](Self::reset_support_code) hands out a
/// fresh capability, initializers register through it, and
/// [`finalize_support_code`](Self::finalize_support_code) freezes it into a
/// library that the run borrows.
pub trait ScenarioEngine {
    /// A compiled, parameter-resolved scenario.
    type TestCase;
    /// Registration capability handed to step-definition initializers.
    type SupportCode;
    /// Immutable step and hook registry produced by finalization.
    type Library;

    /// Compile feature source into test cases, in execution order.
    fn compile(
        &mut self,
        source: &str,
        uri: &str,
    ) -> impl Future<Output = Result<Vec<Self::TestCase>, EngineError>>;

    /// Start a fresh support code namespace.
    fn reset_support_code(&mut self, base_uri: &str, parameters: WorldParameters)
    -> Self::SupportCode;

    /// Freeze registered support code.
    ///
    /// # Errors
    /// Returns [`EngineError::SupportCode`] when a registration was invalid.
    fn finalize_support_code(
        &mut self,
        code: Self::SupportCode,
    ) -> Result<Self::Library, EngineError>;

    /// Run the `BeforeAll` or `AfterAll` hooks.
    fn run_hook_group(
        &mut self,
        library: &Self::Library,
        group: HookGroup,
        listener: &mut dyn EventListener,
    ) -> impl Future<Output = Result<(), EngineError>>;

    /// Execute one test case, emitting its events to `listener`.
    ///
    /// Step failures are reported through events; an `Err` means the engine
    /// itself could not continue.
    fn run_test_case(
        &mut self,
        library: &Self::Library,
        case: &Self::TestCase,
        listener: &mut dyn EventListener,
    ) -> impl Future<Output = Result<(), EngineError>>;

    /// Display-data lookups over the cases compiled so far.
    fn display_data(&self) -> &dyn DisplayData;
}
