//! Sequencing of one feature run.
//!
//! A run moves through compile, support code, start, `BeforeAll` hooks, the
//! scenarios in order, `AfterAll` hooks and end. Failing before the start
//! leaves an empty suite carrying the error; failing after it still ends the
//! suite so the host sees `suiteEnd`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{Instrument, debug, error, info, info_span};

use crate::engine::{EventListener, HookGroup, ScenarioEngine, WorldParameters};
use crate::error::{EngineError, RunError};
use crate::event::EngineEvent;
use crate::host::Host;
use crate::node::SuiteNode;
use crate::tree::TreeBuilder;

/// Registers step definitions and hooks through an engine's capability.
pub type Initializer<C> = Box<dyn Fn(&mut C)>;

/// Settings for every run an orchestrator performs.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::RunOptions;
///
/// let options = RunOptions::default().with_fail_fast(true);
/// assert_eq!(options.feature_uri, "/feature");
/// assert_eq!(options.base_uri, "/");
/// assert!(options.fail_fast);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Uri the feature source is compiled under.
    pub feature_uri: String,
    /// Base uri of the support code namespace.
    pub base_uri: String,
    /// Stop after the first scenario whose test failed.
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            feature_uri: "/feature".to_owned(),
            base_uri: "/".to_owned(),
            fail_fast: false,
        }
    }
}

impl RunOptions {
    /// Set the feature uri.
    #[must_use]
    pub fn with_feature_uri(mut self, uri: impl Into<String>) -> Self {
        self.feature_uri = uri.into();
        self
    }

    /// Enable or disable fail-fast.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Inputs of one run.
pub struct RunRequest<'a, C> {
    /// Name of the suite to build.
    pub suite_name: &'a str,
    /// Feature source text.
    pub source: &'a str,
    /// Step definition initializers, invoked once each in order.
    pub initializers: &'a [Initializer<C>],
    /// Copied onto every scenario's world.
    pub parameters: WorldParameters,
}

impl<'a, C> RunRequest<'a, C> {
    /// A request without initializers or remote.
    #[must_use]
    pub fn new(suite_name: &'a str, source: &'a str) -> Self {
        Self {
            suite_name,
            source,
            initializers: &[],
            parameters: WorldParameters::default(),
        }
    }

    /// Use these initializers.
    #[must_use]
    pub fn with_initializers(mut self, initializers: &'a [Initializer<C>]) -> Self {
        self.initializers = initializers;
        self
    }

    /// Use these world parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: WorldParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Outcome of a run: the suite as built, and whether the run itself
/// completed.
///
/// A successful `result` does not mean every test passed; check the suite.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The suite built during the run.
    pub suite: SuiteNode,
    /// `Err` when compilation, support code, a hook group or the engine
    /// failed.
    pub result: Result<(), RunError>,
}

impl RunReport {
    /// Whether the run completed, the tree was built without faults and
    /// every test passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok() && self.suite.error().is_none() && self.suite.num_failed_tests() == 0
    }
}

/// Drives a [`ScenarioEngine`] through feature runs.
pub struct RunOrchestrator<E> {
    engine: E,
    options: RunOptions,
}

impl<E: ScenarioEngine> RunOrchestrator<E> {
    /// Orchestrate `engine` with `options`.
    #[must_use]
    pub fn new(engine: E, options: RunOptions) -> Self {
        Self { engine, options }
    }

    /// The engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run options.
    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Execute one feature source, reporting to `host`.
    ///
    /// Always completes: failures are returned in the report, attached to
    /// the suite and broadcast as the host `error` event.
    pub async fn run(
        &mut self,
        host: &dyn Host,
        request: RunRequest<'_, E::SupportCode>,
    ) -> RunReport {
        let span = info_span!("feature_run", suite = request.suite_name);
        self.execute(host, request).instrument(span).await
    }

    async fn execute(
        &mut self,
        host: &dyn Host,
        request: RunRequest<'_, E::SupportCode>,
    ) -> RunReport {
        let mut tree = TreeBuilder::new(request.suite_name, host);

        debug!(uri = %self.options.feature_uri, "compiling feature source");
        let cases = match self
            .engine
            .compile(request.source, &self.options.feature_uri)
            .await
        {
            Ok(cases) => cases,
            Err(err) => return abort(tree, RunError::Compile(err)),
        };

        let library = match self.build_support_code(&request) {
            Ok(library) => library,
            Err(err) => return abort(tree, err),
        };

        tree.start_suite().await;
        tree.on_event(&EngineEvent::RunStarted, self.engine.display_data());

        let result = self.run_cases(&library, &cases, &mut tree).await;

        let success = result.is_ok()
            && tree.suite().error().is_none()
            && tree.suite().num_failed_tests() == 0;
        tree.end_suite();
        tree.on_event(
            &EngineEvent::RunFinished { success },
            self.engine.display_data(),
        );
        if let Err(err) = &result {
            error!(error = %err, "feature run failed");
            tree.fail_run(err.clone());
        } else if tree.broadcast_recorded_fault() {
            error!("feature run finished with an inconsistent suite tree");
        } else {
            info!(
                tests = tree.suite().num_tests(),
                failed = tree.suite().num_failed_tests(),
                "feature run finished"
            );
        }
        RunReport {
            suite: tree.into_suite(),
            result,
        }
    }

    fn build_support_code(
        &mut self,
        request: &RunRequest<'_, E::SupportCode>,
    ) -> Result<E::Library, RunError> {
        let mut code = self
            .engine
            .reset_support_code(&self.options.base_uri, request.parameters.clone());
        for (index, initializer) in request.initializers.iter().enumerate() {
            panic::catch_unwind(AssertUnwindSafe(|| initializer(&mut code))).map_err(
                |payload| {
                    RunError::SupportCode(EngineError::SupportCode(format!(
                        "initializer {index} panicked: {}",
                        payload_message(payload.as_ref())
                    )))
                },
            )?;
        }
        debug!(
            initializers = request.initializers.len(),
            "finalizing support code"
        );
        self.engine
            .finalize_support_code(code)
            .map_err(RunError::SupportCode)
    }

    async fn run_cases(
        &mut self,
        library: &E::Library,
        cases: &[E::TestCase],
        tree: &mut TreeBuilder<'_>,
    ) -> Result<(), RunError> {
        self.engine
            .run_hook_group(library, HookGroup::BeforeAll, &mut *tree)
            .await
            .map_err(|source| RunError::Hook {
                group: HookGroup::BeforeAll,
                source,
            })?;

        for (index, case) in cases.iter().enumerate() {
            if index > 0 {
                tokio::task::yield_now().await;
            }
            self.engine
                .run_test_case(library, case, &mut *tree)
                .await
                .map_err(|source| RunError::ScenarioRuntime { index, source })?;
            if self.options.fail_fast && tree.last_test_passed() == Some(false) {
                info!(
                    skipped = cases.len() - index - 1,
                    "stopping after first failed scenario"
                );
                break;
            }
        }

        self.engine
            .run_hook_group(library, HookGroup::AfterAll, &mut *tree)
            .await
            .map_err(|source| RunError::Hook {
                group: HookGroup::AfterAll,
                source,
            })
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

fn abort(mut tree: TreeBuilder<'_>, err: RunError) -> RunReport {
    error!(error = %err, "feature run aborted before start");
    tree.fail_run(err.clone());
    RunReport {
        suite: tree.into_suite(),
        result: Err(err),
    }
}
