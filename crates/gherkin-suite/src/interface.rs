//! Registration entry points.

use gherkin_suite_adapter::{Initializer, ScenarioEngine};

use crate::suite::{FeatureSuite, SuiteParent};

/// Register `source` as a feature suite named `name` under `parent`.
///
/// The suite inherits the parent's remote context and run options. Nothing
/// runs until the suite (or its parent) is run.
pub fn register_cucumber<'p, P>(
    parent: &'p mut P,
    name: &str,
    source: &str,
    initializers: Vec<Initializer<<P::Engine as ScenarioEngine>::SupportCode>>,
) -> &'p mut FeatureSuite<P::Engine>
where
    P: SuiteParent + ?Sized,
    P::Engine: Default,
{
    let suite = FeatureSuite::new(name, source, P::Engine::default(), parent.run_options())
        .with_initializers(initializers)
        .with_remote_handle(parent.remote_handle());
    parent.add_suite(suite)
}

/// Registration surface bound to one parent.
pub struct CucumberInterface<'p, P: ?Sized> {
    parent: &'p mut P,
}

impl<P> CucumberInterface<'_, P>
where
    P: SuiteParent + ?Sized,
    P::Engine: Default,
{
    /// See [`register_cucumber`].
    pub fn register_cucumber(
        &mut self,
        name: &str,
        source: &str,
        initializers: Vec<Initializer<<P::Engine as ScenarioEngine>::SupportCode>>,
    ) -> &mut FeatureSuite<P::Engine> {
        register_cucumber(&mut *self.parent, name, source, initializers)
    }
}

/// The registration surface for `parent`.
pub fn get_interface<P: SuiteParent + ?Sized>(parent: &mut P) -> CucumberInterface<'_, P> {
    CucumberInterface { parent }
}
