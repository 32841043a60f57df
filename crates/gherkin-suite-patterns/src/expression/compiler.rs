//! Turn lexed tokens into an anchored regular-expression source.

use crate::errors::{ExpressionError, placeholder_error};
use crate::parameter::ParameterKind;

use super::lexer::{Token, lex_expression};

/// Anchored regex source plus the parameters it captures, in order.
pub(crate) struct Compiled {
    pub source: String,
    pub parameters: Vec<ParameterKind>,
}

pub(crate) fn compile(expression: &str) -> Result<Compiled, ExpressionError> {
    let tokens = lex_expression(expression)?;
    let mut source = String::with_capacity(expression.len().saturating_mul(2) + 2);
    let mut parameters = Vec::new();
    source.push('^');

    for token in tokens {
        match token {
            Token::Literal(text) => source.push_str(&regex::escape(&text)),
            Token::Optional(text) => {
                source.push_str("(?:");
                source.push_str(&regex::escape(&text));
                source.push_str(")?");
            }
            Token::Parameter { name, hint, .. } => {
                let kind = ParameterKind::from_placeholder(&name, hint.as_deref());
                source.push('(');
                source.push_str(kind.regex_fragment());
                source.push(')');
                parameters.push(kind);
            }
            Token::StrayClose { index } => {
                return Err(placeholder_error(
                    "unmatched closing brace '}' in step expression",
                    index,
                    None,
                ));
            }
        }
    }

    source.push('$');
    Ok(Compiled { source, parameters })
}

/// Build the anchored regular-expression source for a step expression.
///
/// # Errors
/// Returns [`ExpressionError`] when the expression has malformed parameters,
/// stray braces or broken optional groups.
///
/// # Examples
/// ```
/// use gherkin_suite_patterns::build_regex_from_expression;
/// let source = build_regex_from_expression("x = {int}")
///     .unwrap_or_else(|err| panic!("expression should compile: {err}"));
/// assert_eq!(source, r"^x = (-?\d+)$");
/// ```
pub fn build_regex_from_expression(expression: &str) -> Result<String, ExpressionError> {
    compile(expression).map(|compiled| compiled.source)
}
