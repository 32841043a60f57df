//! What a step definition receives and returns.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Failure returned by a step definition or hook.
///
/// Rendered verbatim as the step's exception message.
///
/// # Examples
///
/// ```
/// use gherkin_suite_engine::StepError;
///
/// let err: StepError = "This fails".into();
/// assert_eq!(err.to_string(), "This fails");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
}

impl StepError {
    /// An error with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Arguments matched from one step.
#[derive(Debug, Clone, Copy)]
pub struct StepArgs<'a> {
    text: &'a str,
    captures: &'a [String],
    docstring: Option<&'a str>,
    table: Option<&'a [Vec<String>]>,
}

impl<'a> StepArgs<'a> {
    pub(crate) fn new(
        text: &'a str,
        captures: &'a [String],
        docstring: Option<&'a str>,
        table: Option<&'a [Vec<String>]>,
    ) -> Self {
        Self {
            text,
            captures,
            docstring,
            table,
        }
    }

    /// The full step text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Captured placeholder values in pattern order.
    #[must_use]
    pub fn captures(&self) -> &'a [String] {
        self.captures
    }

    /// The capture at `index`, as matched.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.captures.get(index).map(String::as_str)
    }

    /// Parse the capture at `index`.
    ///
    /// # Errors
    /// Returns a [`StepError`] naming the capture when it is missing or does
    /// not parse as `T`.
    pub fn parse<T>(&self, index: usize) -> Result<T, StepError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self
            .arg(index)
            .ok_or_else(|| StepError::new(format!("step has no argument {index}")))?;
        raw.parse::<T>()
            .map_err(|err| StepError::new(format!("argument {index} (`{raw}`): {err}")))
    }

    /// The attached doc string.
    #[must_use]
    pub fn docstring(&self) -> Option<&'a str> {
        self.docstring
    }

    /// The attached data table, header row included.
    #[must_use]
    pub fn table(&self) -> Option<&'a [Vec<String>]> {
        self.table
    }
}

/// Render a panic payload as a message.
///
/// # Examples
/// ```
/// use gherkin_suite_engine::panic_message;
///
/// let err = std::panic::catch_unwind(|| panic!("boom"))
///     .expect_err("expected panic");
/// assert_eq!(panic_message(err.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(val) = payload.downcast_ref::<$ty>() {
                    return val.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, StepError, i32, u32, i64, u64, isize, usize, f32, f64);
    format!("step panicked with a non-string payload ({:?})", payload.type_id())
}
