//! Semantic step keywords.
//!
//! Feature text may spell a step with `And`, `But` or `*`; the parser
//! resolves those to the preceding primary keyword, so only the three primary
//! keywords exist here.

use gherkin::StepType;
use std::fmt;

/// Primary keyword a step definition was registered under or a step
/// resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// Preconditions.
    Given,
    /// Actions.
    When,
    /// Outcomes.
    Then,
}

impl StepKeyword {
    /// Canonical English spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use gherkin_suite_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::When.as_str(), "When");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StepType> for StepKeyword {
    fn from(ty: StepType) -> Self {
        match ty {
            StepType::Given => Self::Given,
            StepType::When => Self::When,
            StepType::Then => Self::Then,
        }
    }
}
