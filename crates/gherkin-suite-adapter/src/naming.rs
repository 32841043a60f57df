//! Per-run disambiguation of repeated scenario names.

use std::collections::HashMap;

/// Counts display names seen during one run.
///
/// The first occurrence of a name is returned unchanged. The k-th occurrence
/// becomes `"<name> (<k>)"`, so an outline expanded three times yields
/// `O`, `O (2)` and `O (3)`.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::NameRegistry;
///
/// let mut names = NameRegistry::new();
/// assert_eq!(names.disambiguate("O"), "O");
/// assert_eq!(names.disambiguate("O"), "O (2)");
/// names.reset();
/// assert_eq!(names.disambiguate("O"), "O");
/// ```
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    counts: HashMap<String, usize>,
}

impl NameRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `raw` for display, counting this occurrence.
    pub fn disambiguate(&mut self, raw: &str) -> String {
        let count = self.counts.entry(raw.to_owned()).or_insert(0);
        let seen = *count;
        *count += 1;
        if seen == 0 {
            raw.to_owned()
        } else {
            format!("{raw} ({})", *count)
        }
    }

    /// Forget every name seen so far.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
