//! Registration of step definitions and hooks.
//!
//! [`StepDefinitions`] is the capability handed to initializers. It collects
//! registrations without validating them; [`StepDefinitions::finalize`]
//! compiles every pattern and freezes the result into a
//! [`SupportCodeLibrary`] that one run borrows.

use std::collections::HashSet;
use std::fmt;
use std::panic::Location;

use gherkin_suite_adapter::WorldParameters;
use gherkin_suite_patterns::{ExpressionError, StepExpression, StepKeyword};
use regex::Regex;
use thiserror::Error;

use crate::step::{StepArgs, StepError};
use crate::world::World;

type StepBody = Box<dyn Fn(&mut World, &StepArgs<'_>) -> Result<(), StepError>>;
type HookBody = Box<dyn Fn(&mut World) -> Result<(), StepError>>;
type GlobalHookBody = Box<dyn Fn() -> Result<(), StepError>>;
type WorldConstructor = Box<dyn Fn(&mut World)>;

/// Source location of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionLocation {
    file: &'static str,
    line: u32,
}

impl DefinitionLocation {
    #[track_caller]
    pub(crate) fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// Source file.
    #[must_use]
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// One-based line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for DefinitionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// How a step definition matches step text.
#[derive(Debug, Clone)]
pub enum StepPattern {
    /// Cucumber expression such as `x = {int}`.
    Expression(String),
    /// Regular expression; each group is one argument.
    Regex(Regex),
}

impl From<&str> for StepPattern {
    fn from(value: &str) -> Self {
        Self::Expression(value.to_owned())
    }
}

impl From<String> for StepPattern {
    fn from(value: String) -> Self {
        Self::Expression(value)
    }
}

impl From<Regex> for StepPattern {
    fn from(value: Regex) -> Self {
        Self::Regex(value)
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(source) => f.write_str(source),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// A registration rejected by [`StepDefinitions::finalize`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupportCodeError {
    /// A step pattern did not compile.
    #[error("step pattern `{pattern}` registered at {location} is invalid: {source}")]
    InvalidPattern {
        /// The pattern as registered.
        pattern: String,
        /// Where it was registered.
        location: DefinitionLocation,
        /// Why it was rejected.
        source: ExpressionError,
    },
}

struct Registered<B> {
    location: DefinitionLocation,
    body: B,
}

struct PendingStep {
    keyword: StepKeyword,
    pattern: StepPattern,
    registered: Registered<StepBody>,
}

/// Capability through which initializers register support code.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::WorldParameters;
/// use gherkin_suite_engine::StepDefinitions;
///
/// let mut steps = StepDefinitions::new("/", WorldParameters::default());
/// steps
///     .given("x = {int}", |world, args| {
///         world.insert(args.parse::<i64>(0)?);
///         Ok(())
///     })
///     .then("x is set", |world, _| {
///         world.get::<i64>().map(|_| ()).ok_or_else(|| "x is unset".into())
///     });
/// let library = steps
///     .finalize()
///     .unwrap_or_else(|err| panic!("patterns should compile: {err}"));
/// assert_eq!(library.step_count(), 2);
/// ```
pub struct StepDefinitions {
    base_uri: String,
    parameters: WorldParameters,
    steps: Vec<PendingStep>,
    before: Vec<Registered<HookBody>>,
    after: Vec<Registered<HookBody>>,
    before_all: Vec<Registered<GlobalHookBody>>,
    after_all: Vec<Registered<GlobalHookBody>>,
    world_constructor: Option<WorldConstructor>,
}

impl StepDefinitions {
    /// An empty namespace.
    #[must_use]
    pub fn new(base_uri: impl Into<String>, parameters: WorldParameters) -> Self {
        Self {
            base_uri: base_uri.into(),
            parameters,
            steps: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
            world_constructor: None,
        }
    }

    /// Base uri of this namespace.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Parameters every world will be created with.
    #[must_use]
    pub fn parameters(&self) -> &WorldParameters {
        &self.parameters
    }

    /// Register a `Given` step. Matching ignores the keyword.
    #[track_caller]
    pub fn given<P, F>(&mut self, pattern: P, body: F) -> &mut Self
    where
        P: Into<StepPattern>,
        F: Fn(&mut World, &StepArgs<'_>) -> Result<(), StepError> + 'static,
    {
        let location = DefinitionLocation::caller();
        self.push_step(StepKeyword::Given, pattern.into(), location, Box::new(body))
    }

    /// Register a `When` step.
    #[track_caller]
    pub fn when<P, F>(&mut self, pattern: P, body: F) -> &mut Self
    where
        P: Into<StepPattern>,
        F: Fn(&mut World, &StepArgs<'_>) -> Result<(), StepError> + 'static,
    {
        let location = DefinitionLocation::caller();
        self.push_step(StepKeyword::When, pattern.into(), location, Box::new(body))
    }

    /// Register a `Then` step.
    #[track_caller]
    pub fn then<P, F>(&mut self, pattern: P, body: F) -> &mut Self
    where
        P: Into<StepPattern>,
        F: Fn(&mut World, &StepArgs<'_>) -> Result<(), StepError> + 'static,
    {
        let location = DefinitionLocation::caller();
        self.push_step(StepKeyword::Then, pattern.into(), location, Box::new(body))
    }

    /// Run `body` before every scenario.
    #[track_caller]
    pub fn before<F>(&mut self, body: F) -> &mut Self
    where
        F: Fn(&mut World) -> Result<(), StepError> + 'static,
    {
        self.before.push(Registered {
            location: DefinitionLocation::caller(),
            body: Box::new(body),
        });
        self
    }

    /// Run `body` after every scenario, whether or not it passed.
    #[track_caller]
    pub fn after<F>(&mut self, body: F) -> &mut Self
    where
        F: Fn(&mut World) -> Result<(), StepError> + 'static,
    {
        self.after.push(Registered {
            location: DefinitionLocation::caller(),
            body: Box::new(body),
        });
        self
    }

    /// Run `body` once before the first scenario.
    #[track_caller]
    pub fn before_all<F>(&mut self, body: F) -> &mut Self
    where
        F: Fn() -> Result<(), StepError> + 'static,
    {
        self.before_all.push(Registered {
            location: DefinitionLocation::caller(),
            body: Box::new(body),
        });
        self
    }

    /// Run `body` once after the last scenario.
    #[track_caller]
    pub fn after_all<F>(&mut self, body: F) -> &mut Self
    where
        F: Fn() -> Result<(), StepError> + 'static,
    {
        self.after_all.push(Registered {
            location: DefinitionLocation::caller(),
            body: Box::new(body),
        });
        self
    }

    /// Prepare every new world with `constructor`. The last call wins.
    pub fn set_world_constructor<F>(&mut self, constructor: F) -> &mut Self
    where
        F: Fn(&mut World) + 'static,
    {
        self.world_constructor = Some(Box::new(constructor));
        self
    }

    fn push_step(
        &mut self,
        keyword: StepKeyword,
        pattern: StepPattern,
        location: DefinitionLocation,
        body: StepBody,
    ) -> &mut Self {
        self.steps.push(PendingStep {
            keyword,
            pattern,
            registered: Registered { location, body },
        });
        self
    }

    /// Compile every step pattern and freeze the registrations.
    ///
    /// # Errors
    /// Returns [`SupportCodeError::InvalidPattern`] for the first pattern
    /// that does not compile.
    pub fn finalize(self) -> Result<SupportCodeLibrary, SupportCodeError> {
        let mut seen = HashSet::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for pending in self.steps {
            let text = pending.pattern.to_string();
            let expression = match pending.pattern {
                StepPattern::Expression(expr) => StepExpression::parse(&expr),
                StepPattern::Regex(re) => Ok(StepExpression::from_regex(re)),
            }
            .map_err(|source| SupportCodeError::InvalidPattern {
                pattern: text.clone(),
                location: pending.registered.location,
                source,
            })?;
            if !seen.insert(text.clone()) {
                log::warn!(
                    "step pattern `{text}` at {} duplicates an earlier registration",
                    pending.registered.location
                );
            }
            steps.push(StepDefinition {
                keyword: pending.keyword,
                expression,
                registered: pending.registered,
            });
        }
        log::debug!(
            "support code for {} finalized with {} step definitions",
            self.base_uri,
            steps.len()
        );
        Ok(SupportCodeLibrary {
            parameters: self.parameters,
            steps,
            before: self.before,
            after: self.after,
            before_all: self.before_all,
            after_all: self.after_all,
            world_constructor: self.world_constructor,
        })
    }
}

impl fmt::Debug for StepDefinitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinitions")
            .field("base_uri", &self.base_uri)
            .field("steps", &self.steps.len())
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish_non_exhaustive()
    }
}

pub(crate) struct StepDefinition {
    keyword: StepKeyword,
    expression: StepExpression,
    registered: Registered<StepBody>,
}

impl StepDefinition {
    pub(crate) fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    pub(crate) fn pattern(&self) -> &str {
        self.expression.source()
    }

    pub(crate) fn location(&self) -> DefinitionLocation {
        self.registered.location
    }

    pub(crate) fn invoke(&self, world: &mut World, args: &StepArgs<'_>) -> Result<(), StepError> {
        (self.registered.body)(world, args)
    }
}

/// A registered scenario or global hook.
pub(crate) struct HookRef<'a, B: ?Sized> {
    pub(crate) location: DefinitionLocation,
    pub(crate) body: &'a B,
}

/// Frozen step definitions and hooks for one run.
pub struct SupportCodeLibrary {
    parameters: WorldParameters,
    steps: Vec<StepDefinition>,
    before: Vec<Registered<HookBody>>,
    after: Vec<Registered<HookBody>>,
    before_all: Vec<Registered<GlobalHookBody>>,
    after_all: Vec<Registered<GlobalHookBody>>,
    world_constructor: Option<WorldConstructor>,
}

impl SupportCodeLibrary {
    /// Number of step definitions.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Patterns in registration order with their locations.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, DefinitionLocation)> {
        self.steps.iter().map(|s| (s.pattern(), s.location()))
    }

    /// A fresh world for one scenario.
    #[must_use]
    pub fn new_world(&self) -> World {
        let mut world = World::new(self.parameters.clone());
        if let Some(constructor) = &self.world_constructor {
            constructor(&mut world);
        }
        world
    }

    /// Definitions matching `text`, with their captures.
    pub(crate) fn matching(&self, text: &str) -> Vec<(&StepDefinition, Vec<String>)> {
        self.steps
            .iter()
            .filter_map(|def| def.expression.captures(text).map(|caps| (def, caps)))
            .collect()
    }

    pub(crate) fn before_hooks(
        &self,
    ) -> impl Iterator<Item = HookRef<'_, dyn Fn(&mut World) -> Result<(), StepError>>> {
        hook_refs(&self.before)
    }

    pub(crate) fn after_hooks(
        &self,
    ) -> impl Iterator<Item = HookRef<'_, dyn Fn(&mut World) -> Result<(), StepError>>> {
        hook_refs(&self.after)
    }

    pub(crate) fn global_hooks(
        &self,
        before: bool,
    ) -> impl Iterator<Item = HookRef<'_, dyn Fn() -> Result<(), StepError>>> {
        hook_refs(if before {
            &self.before_all
        } else {
            &self.after_all
        })
    }
}

fn hook_refs<B: ?Sized>(hooks: &[Registered<Box<B>>]) -> impl Iterator<Item = HookRef<'_, B>> {
    hooks.iter().map(|h| HookRef {
        location: h.location,
        body: h.body.as_ref(),
    })
}

impl fmt::Debug for SupportCodeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupportCodeLibrary")
            .field("steps", &self.steps.len())
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("before_all", &self.before_all.len())
            .field("after_all", &self.after_all.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut World, _: &StepArgs<'_>) -> Result<(), StepError> {
        Ok(())
    }

    #[test]
    fn invalid_patterns_fail_finalization() {
        let mut steps = StepDefinitions::new("/", WorldParameters::default());
        steps.given("x = {int", noop);
        let err = steps.finalize().err().map(|e| e.to_string());
        assert!(err.is_some_and(|m| m.contains("step pattern `x = {int`")));
    }

    #[test]
    fn matching_ignores_the_keyword() {
        let mut steps = StepDefinitions::new("/", WorldParameters::default());
        steps.given("y = {int}", noop);
        let library = steps
            .finalize()
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        let matches = library.matching("y = 5");
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches.first().map(|(def, caps)| (def.keyword(), caps.clone())),
            Some((StepKeyword::Given, vec!["5".to_owned()]))
        );
    }

    #[test]
    fn regex_patterns_capture_groups() {
        let mut steps = StepDefinitions::new("/", WorldParameters::default());
        let re = Regex::new(r"^I have (\d+) cukes$")
            .unwrap_or_else(|err| panic!("regex should compile: {err}"));
        steps.when(re, noop);
        let library = steps
            .finalize()
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        let caps = library.matching("I have 12 cukes");
        assert_eq!(caps.first().map(|(_, c)| c.clone()), Some(vec!["12".to_owned()]));
    }

    #[test]
    fn locations_point_at_the_registration() {
        let mut steps = StepDefinitions::new("/", WorldParameters::default());
        let line = line!() + 1;
        steps.then("done", noop);
        let library = steps
            .finalize()
            .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
        let locations: Vec<DefinitionLocation> = library.patterns().map(|(_, l)| l).collect();
        assert_eq!(locations.first().map(DefinitionLocation::line), Some(line));
        assert!(locations.first().is_some_and(|l| l.file().ends_with("support.rs")));
    }

    #[test]
    fn world_constructor_prepares_each_world() {
        let mut steps = StepDefinitions::new("/", WorldParameters::with_remote(3_u8));
        steps.set_world_constructor(|world| {
            world.insert(String::from("ready"));
        });
        let library = steps
            .finalize()
            .unwrap_or_else(|err| panic!("nothing to compile: {err}"));
        let world = library.new_world();
        assert_eq!(world.get::<String>().map(String::as_str), Some("ready"));
        assert_eq!(world.remote::<u8>(), Some(&3));
    }
}
