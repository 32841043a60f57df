//! Errors raised while compiling step expressions.

use std::fmt;
use thiserror::Error;

/// Location and context of a malformed `{...}` parameter.
///
/// # Examples
/// ```
/// use gherkin_suite_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("invalid parameter", 4, Some("count".into()));
/// assert_eq!(info.position, 4);
/// assert_eq!(info.placeholder.as_deref(), Some("count"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Short description of what went wrong.
    pub message: &'static str,
    /// Byte offset of the opening brace.
    pub position: usize,
    /// Parameter name, when one could be read.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Describe a parameter failure at `position`.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.placeholder.as_deref() {
            Some(name) if !name.is_empty() => write!(
                f,
                "{} `{{{name}}}` at byte {}",
                self.message, self.position
            ),
            _ => write!(f, "{} at byte {}", self.message, self.position),
        }
    }
}

/// Errors surfaced while turning a step expression into a regular expression.
///
/// # Examples
/// ```
/// use gherkin_suite_patterns::{ExpressionError, StepExpression};
/// let Err(err) = StepExpression::parse("I am (unfinished") else {
///     panic!("expression should be rejected");
/// };
/// assert!(matches!(err, ExpressionError::UnterminatedOptional { position: 5 }));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExpressionError {
    /// A `{...}` parameter is malformed or unbalanced.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// An optional `(...)` group never closes.
    #[error("optional text opened at byte {position} is never closed")]
    UnterminatedOptional {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },
    /// An optional group such as `()` contains nothing.
    #[error("optional text at byte {position} is empty")]
    EmptyOptional {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },
    /// Parameters may not appear inside optional text.
    #[error("optional text at byte {position} must not contain parameters")]
    ParameterInOptional {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },
    /// The generated regular expression failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> ExpressionError {
    ExpressionError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}
