//! Display data for compiled cases.

use std::collections::HashMap;

use gherkin_suite_adapter::{
    CaseDisplayData, DisplayData, SourceLocation, StepDisplayData, TestStepId,
};

use crate::pickle::Pickle;
use crate::support::SupportCodeLibrary;

/// Indexes compiled cases by location and their executable steps by
/// position.
///
/// Scenario hooks occupy step positions too, labelled `Before` or `After`
/// with their registration site.
#[derive(Debug, Default)]
pub struct EventDataCollector {
    cases: HashMap<SourceLocation, String>,
    steps: HashMap<TestStepId, StepDisplayData>,
}

impl EventDataCollector {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget previous cases and index `pickles`.
    pub fn record_pickles(&mut self, pickles: &[Pickle]) {
        self.cases.clear();
        self.steps.clear();
        for pickle in pickles {
            self.cases.insert(pickle.location.clone(), pickle.name.clone());
        }
    }

    /// Index the executable steps of `pickle` as `library` will run them.
    ///
    /// Returns the number of steps indexed.
    pub fn prepare(&mut self, pickle: &Pickle, library: &SupportCodeLibrary) -> usize {
        let hooks_before = library
            .before_hooks()
            .map(|h| StepDisplayData::new("Before", h.location.to_string()));
        let steps = pickle
            .steps
            .iter()
            .map(|s| StepDisplayData::new(s.keyword.as_str(), s.text.as_str()));
        let hooks_after = library
            .after_hooks()
            .map(|h| StepDisplayData::new("After", h.location.to_string()));
        let mut count = 0;
        for (index, data) in hooks_before.chain(steps).chain(hooks_after).enumerate() {
            self.steps.insert(
                TestStepId {
                    case: pickle.id,
                    index,
                },
                data,
            );
            count += 1;
        }
        count
    }

    /// Number of indexed cases.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

impl DisplayData for EventDataCollector {
    fn case_display_data(&self, location: &SourceLocation) -> Option<CaseDisplayData> {
        self.cases
            .get(location)
            .map(|name| CaseDisplayData { name: name.clone() })
    }

    fn step_display_data(&self, step: TestStepId) -> Option<StepDisplayData> {
        self.steps.get(&step).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pickle::compile_feature;
    use crate::support::StepDefinitions;
    use gherkin_suite_adapter::WorldParameters;

    #[test]
    fn steps_are_indexed_after_before_hooks() {
        let pickles = compile_feature("Feature: F\nScenario: S\nGiven x = 5\nAnd y = 5\n", "/f")
            .unwrap_or_else(|err| panic!("feature should compile: {err}"));
        let mut definitions = StepDefinitions::new("/", WorldParameters::default());
        definitions.before(|_| Ok(()));
        let library = definitions
            .finalize()
            .unwrap_or_else(|err| panic!("nothing to compile: {err}"));

        let mut collector = EventDataCollector::new();
        collector.record_pickles(&pickles);
        let Some(pickle) = pickles.first() else {
            panic!("one pickle expected");
        };
        assert_eq!(collector.prepare(pickle, &library), 3);
        assert_eq!(collector.case_count(), 1);

        let label = |index| {
            collector
                .step_display_data(TestStepId {
                    case: pickle.id,
                    index,
                })
                .map(|d| d.label())
        };
        assert!(label(0).is_some_and(|l| l.starts_with("Before ")));
        assert_eq!(label(2), Some("And y = 5".to_owned()));
        assert_eq!(
            collector
                .case_display_data(&SourceLocation::new("/f", 2))
                .map(|d| d.name),
            Some("S".to_owned())
        );
    }
}
