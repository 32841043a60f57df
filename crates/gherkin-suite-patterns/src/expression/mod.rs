//! Compiled step expressions.

mod compiler;
mod lexer;

use std::fmt;

use regex::Regex;

use crate::capture::extract_captured_values;
use crate::errors::ExpressionError;
use crate::parameter::ParameterKind;

pub use compiler::build_regex_from_expression;

/// A step pattern ready for matching against step text.
///
/// Built either from a cucumber-style expression with [`parse`](Self::parse)
/// or from a hand-written [`Regex`] with [`from_regex`](Self::from_regex).
///
/// # Examples
/// ```
/// use gherkin_suite_patterns::StepExpression;
/// let expr = StepExpression::parse("I have {int} cucumber(s)")
///     .unwrap_or_else(|err| panic!("expression should compile: {err}"));
/// assert_eq!(expr.captures("I have 1 cucumber"), Some(vec!["1".to_string()]));
/// assert_eq!(expr.captures("I have 12 cucumbers"), Some(vec!["12".to_string()]));
/// assert_eq!(expr.captures("I have none"), None);
/// ```
#[derive(Clone)]
pub struct StepExpression {
    source: String,
    regex: Regex,
    parameters: Vec<ParameterKind>,
}

impl StepExpression {
    /// Compile a cucumber-style expression.
    ///
    /// # Errors
    /// Returns [`ExpressionError`] when the expression is malformed or the
    /// generated regex cannot be compiled.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let compiled = compiler::compile(expression)?;
        let regex = Regex::new(&compiled.source)?;
        Ok(Self {
            source: expression.to_owned(),
            regex,
            parameters: compiled.parameters,
        })
    }

    /// Wrap a regular expression; every capture group becomes an
    /// untyped argument.
    #[must_use]
    pub fn from_regex(regex: Regex) -> Self {
        let groups = regex.captures_len().saturating_sub(1);
        Self {
            source: regex.as_str().to_owned(),
            regex,
            parameters: vec![ParameterKind::Anonymous; groups],
        }
    }

    /// The expression or regex text as registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameters in capture order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterKind] {
        &self.parameters
    }

    /// Whether `text` matches without extracting arguments.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Match `text` and return the normalised arguments, or `None` when the
    /// expression does not match.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        let raw = extract_captured_values(&self.regex, text)?;
        Some(
            raw.iter()
                .enumerate()
                .map(|(i, value)| match self.parameters.get(i) {
                    Some(kind) => kind.normalise(value),
                    None => value.clone(),
                })
                .collect(),
        )
    }
}

impl fmt::Debug for StepExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepExpression")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for StepExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
