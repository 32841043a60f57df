//! Capture-group extraction.

use regex::Regex;

/// Collect the capture groups of `re` against `text`, or `None` on no match.
///
/// Group 0 is skipped. Groups that did not participate yield empty strings
/// so positions stay aligned with the declared parameters.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use gherkin_suite_patterns::extract_captured_values;
/// let regex = Regex::new(r"^(\w+)=(\d+)?$")
///     .unwrap_or_else(|err| panic!("regex should compile: {err}"));
/// assert_eq!(
///     extract_captured_values(&regex, "x="),
///     Some(vec!["x".to_string(), String::new()])
/// );
/// assert!(extract_captured_values(&regex, "=").is_none());
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect(),
    )
}
