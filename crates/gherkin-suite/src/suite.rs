//! Feature suites and the parents that own them.

use std::any::Any;
use std::sync::Arc;

use gherkin_suite_adapter::{
    Host, Initializer, RunOptions, RunOrchestrator, RunReport, RunRequest, ScenarioEngine,
    SuiteNode, WorldParameters, block_on_local,
};
use gherkin_suite_engine::GherkinEngine;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;

/// Shared handle to the opaque remote context.
pub type RemoteHandle = Arc<dyn Any + Send + Sync>;

/// One feature registered with a host.
///
/// Holds everything a run needs and the report of the latest run. Running
/// again rebuilds the suite from scratch.
pub struct FeatureSuite<E: ScenarioEngine = GherkinEngine> {
    name: String,
    source: String,
    initializers: Vec<Initializer<E::SupportCode>>,
    remote: Option<RemoteHandle>,
    orchestrator: RunOrchestrator<E>,
    report: Option<RunReport>,
}

impl<E: ScenarioEngine> FeatureSuite<E> {
    /// A suite running `source` on `engine`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        engine: E,
        options: RunOptions,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            initializers: Vec::new(),
            remote: None,
            orchestrator: RunOrchestrator::new(engine, options),
            report: None,
        }
    }

    /// Use these step-definition initializers.
    #[must_use]
    pub fn with_initializers(mut self, initializers: Vec<Initializer<E::SupportCode>>) -> Self {
        self.initializers = initializers;
        self
    }

    /// Hand `remote` to every scenario's world.
    #[must_use]
    pub fn with_remote_handle(mut self, remote: Option<RemoteHandle>) -> Self {
        self.remote = remote;
        self
    }

    /// Suite name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The latest run's report.
    #[must_use]
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    /// The suite built by the latest run.
    #[must_use]
    pub fn suite(&self) -> Option<&SuiteNode> {
        self.report.as_ref().map(|r| &r.suite)
    }

    /// Run the feature, reporting to `host`.
    ///
    /// Always completes. Run-level failures are in the report and on the
    /// suite; step failures are on the tests.
    pub async fn run(&mut self, host: &dyn Host) -> &RunReport {
        let request = RunRequest::new(&self.name, &self.source)
            .with_initializers(&self.initializers)
            .with_parameters(WorldParameters::from_handle(self.remote.clone()));
        let report = self.orchestrator.run(host, request).await;
        info!(
            suite = %self.name,
            tests = report.suite.num_tests(),
            passed = report.suite.num_passed_tests(),
            failed = report.suite.num_failed_tests(),
            "feature suite finished"
        );
        self.report.insert(report)
    }

    /// [`run`](Self::run) on a fresh current-thread runtime.
    ///
    /// # Errors
    /// Returns the I/O error raised when the runtime cannot be built.
    pub fn run_blocking(&mut self, host: &dyn Host) -> std::io::Result<&RunReport> {
        block_on_local(self.run(host))
    }
}

/// A host-side owner of feature suites.
pub trait SuiteParent {
    /// Engine the child suites run on.
    type Engine: ScenarioEngine;

    /// Remote context handed to child suites.
    fn remote_handle(&self) -> Option<RemoteHandle>;

    /// Options for child suites.
    fn run_options(&self) -> RunOptions;

    /// Take ownership of `suite`.
    fn add_suite(&mut self, suite: FeatureSuite<Self::Engine>) -> &mut FeatureSuite<Self::Engine>;
}

/// Top-level parent: runs its features in registration order.
///
/// # Examples
///
/// ```
/// use gherkin_suite::{HarnessConfig, RootSuite, SuiteParent};
///
/// let root: RootSuite = RootSuite::new(HarnessConfig::default()).with_remote(42_u32);
/// assert!(root.remote_handle().is_some());
/// assert!(root.suites().is_empty());
/// ```
pub struct RootSuite<E: ScenarioEngine = GherkinEngine> {
    config: HarnessConfig,
    remote: Option<RemoteHandle>,
    suites: Vec<FeatureSuite<E>>,
}

impl<E: ScenarioEngine> RootSuite<E> {
    /// An empty root.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            remote: None,
            suites: Vec::new(),
        }
    }

    /// Share `remote` with every child suite.
    #[must_use]
    pub fn with_remote<T: Any + Send + Sync>(mut self, remote: T) -> Self {
        self.remote = Some(Arc::new(remote));
        self
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Child suites in registration order.
    #[must_use]
    pub fn suites(&self) -> &[FeatureSuite<E>] {
        &self.suites
    }

    /// Look a child up by name.
    #[must_use]
    pub fn suite(&self, name: &str) -> Option<&FeatureSuite<E>> {
        self.suites.iter().find(|s| s.name() == name)
    }

    /// Run every child in order. Returns whether all of them succeeded.
    pub async fn run(&mut self, host: &dyn Host) -> bool {
        let mut success = true;
        for suite in &mut self.suites {
            if !suite.run(host).await.is_success() {
                warn!(suite = %suite.name, "feature suite did not pass");
                success = false;
            }
        }
        success
    }

    /// [`run`](Self::run) on a fresh current-thread runtime.
    ///
    /// # Errors
    /// Returns the I/O error raised when the runtime cannot be built.
    pub fn run_blocking(&mut self, host: &dyn Host) -> std::io::Result<bool> {
        block_on_local(self.run(host))
    }
}

impl<E: ScenarioEngine> SuiteParent for RootSuite<E> {
    type Engine = E;

    fn remote_handle(&self) -> Option<RemoteHandle> {
        self.remote.clone()
    }

    fn run_options(&self) -> RunOptions {
        self.config.run_options()
    }

    fn add_suite(&mut self, suite: FeatureSuite<E>) -> &mut FeatureSuite<E> {
        debug!(suite = suite.name(), "registering feature suite");
        self.suites.push(suite);
        match self.suites.last_mut() {
            Some(suite) => suite,
            None => unreachable!("a suite was just pushed"),
        }
    }
}
