//! Step expression parsing for gherkin-suite.
//!
//! Step definitions are registered with cucumber-style expressions such as
//! `I have {int} cukes` or `the light is (not )green`. This crate lexes those
//! expressions, compiles them into anchored regular expressions and turns the
//! captured text back into argument strings. The engine and the adapter share
//! the [`StepKeyword`] type defined here.

mod capture;
mod errors;
mod expression;
mod keyword;
mod parameter;

pub use capture::extract_captured_values;
pub use errors::{ExpressionError, PlaceholderErrorInfo};
pub use expression::{StepExpression, build_regex_from_expression};
pub use keyword::StepKeyword;
pub use parameter::ParameterKind;
