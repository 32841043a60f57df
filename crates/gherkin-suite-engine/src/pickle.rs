//! Compilation of feature text into pickles.
//!
//! A pickle is one runnable scenario: background steps prepended, outline
//! placeholders replaced with the values of one examples row, rules
//! flattened away.

use std::sync::LazyLock;

use gherkin::GherkinEnv;
use gherkin_suite_adapter::{EngineError, SourceLocation, TestCaseId};
use gherkin_suite_patterns::StepKeyword;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^>\s][^>]*)>")
        .unwrap_or_else(|e| unreachable!("placeholder regex should compile: {e}"))
});

/// One step of a pickle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickleStep {
    /// Keyword as written, e.g. `And`.
    pub keyword: String,
    /// Keyword the parser resolved `And`/`But` to.
    pub kind: StepKeyword,
    /// Step text with placeholders substituted.
    pub text: String,
    /// Attached doc string.
    pub docstring: Option<String>,
    /// Attached data table, header row included.
    pub table: Option<Vec<Vec<String>>>,
}

/// A compiled, parameter-resolved scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pickle {
    /// Position in execution order.
    pub id: TestCaseId,
    /// Scenario name with placeholders substituted.
    pub name: String,
    /// Scenario line, or examples row line for outlines.
    pub location: SourceLocation,
    /// Feature, rule, scenario and examples tags, in that order.
    pub tags: Vec<String>,
    /// Background steps followed by scenario steps.
    pub steps: Vec<PickleStep>,
}

/// Parse `source` and expand it into pickles.
///
/// # Errors
/// Returns [`EngineError::Parse`] when the source is not valid Gherkin.
///
/// # Examples
///
/// ```
/// use gherkin_suite_engine::compile_feature;
///
/// let pickles = compile_feature("Feature: F\nScenario: S\nGiven x = 5", "/feature")
///     .unwrap_or_else(|err| panic!("feature should compile: {err}"));
/// assert_eq!(pickles.len(), 1);
/// assert_eq!(pickles.first().map(|p| p.location.line), Some(2));
/// ```
pub fn compile_feature(source: &str, uri: &str) -> Result<Vec<Pickle>, EngineError> {
    let mut text = source.to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let feature = gherkin::Feature::parse(text.as_str(), GherkinEnv::default())
        .map_err(|err| EngineError::Parse(err.to_string()))?;

    let mut out = PickleSink {
        source: &text,
        uri,
        pickles: Vec::new(),
    };
    let background = feature
        .background
        .as_ref()
        .map_or(&[][..], |b| b.steps.as_slice());
    for scenario in &feature.scenarios {
        out.scenario(scenario, background, &feature.tags);
    }
    for rule in &feature.rules {
        let mut steps = background.to_vec();
        if let Some(rule_background) = rule.background.as_ref() {
            steps.extend(rule_background.steps.iter().cloned());
        }
        let tags: Vec<String> = feature.tags.iter().chain(&rule.tags).cloned().collect();
        for scenario in &rule.scenarios {
            out.scenario(scenario, &steps, &tags);
        }
    }
    Ok(out.pickles)
}

struct PickleSink<'a> {
    source: &'a str,
    uri: &'a str,
    pickles: Vec<Pickle>,
}

impl PickleSink<'_> {
    fn scenario(
        &mut self,
        scenario: &gherkin::Scenario,
        background: &[gherkin::Step],
        inherited_tags: &[String],
    ) {
        let tags: Vec<String> = inherited_tags
            .iter()
            .chain(&scenario.tags)
            .cloned()
            .collect();
        if scenario.examples.is_empty() {
            self.push(scenario, background, tags, scenario.position.line, &Row::EMPTY);
            return;
        }
        for examples in &scenario.examples {
            let Some(table) = examples.table.as_ref() else {
                continue;
            };
            let Some((header, rows)) = table.rows.split_first() else {
                continue;
            };
            let lines = row_lines(self.source, table.span.start, table.span.end);
            let mut example_tags = tags.clone();
            example_tags.extend(examples.tags.iter().cloned());
            for (i, values) in rows.iter().enumerate() {
                let line = lines
                    .get(i + 1)
                    .copied()
                    .unwrap_or(table.position.line + i + 1);
                let row = Row { header, values };
                self.push(scenario, background, example_tags.clone(), line, &row);
            }
        }
    }

    fn push(
        &mut self,
        scenario: &gherkin::Scenario,
        background: &[gherkin::Step],
        tags: Vec<String>,
        line: usize,
        row: &Row<'_>,
    ) {
        let steps = background
            .iter()
            .chain(&scenario.steps)
            .map(|step| PickleStep {
                keyword: step.keyword.trim().to_owned(),
                kind: StepKeyword::from(step.ty),
                text: row.substitute(&step.value),
                docstring: step.docstring.as_deref().map(|d| row.substitute(d)),
                table: step.table.as_ref().map(|t| {
                    t.rows
                        .iter()
                        .map(|cells| cells.iter().map(|c| row.substitute(c)).collect())
                        .collect()
                }),
            })
            .collect();
        self.pickles.push(Pickle {
            id: TestCaseId(self.pickles.len()),
            name: row.substitute(&scenario.name),
            location: SourceLocation::new(self.uri, line),
            tags,
            steps,
        });
    }
}

/// One examples row keyed by its header.
struct Row<'a> {
    header: &'a [String],
    values: &'a [String],
}

impl Row<'_> {
    const EMPTY: Row<'static> = Row {
        header: &[],
        values: &[],
    };

    /// Replace `<name>` with the row's value; unknown names stay as written.
    fn substitute(&self, text: &str) -> String {
        if self.header.is_empty() {
            return text.to_owned();
        }
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                    return whole.to_owned();
                };
                self.header
                    .iter()
                    .position(|h| h == name)
                    .and_then(|i| self.values.get(i))
                    .map_or_else(|| whole.to_owned(), Clone::clone)
            })
            .into_owned()
    }
}

/// One-based line containing byte `offset`.
fn line_of(source: &str, offset: usize) -> usize {
    source
        .get(..offset)
        .map_or(0, |prefix| prefix.matches('\n').count())
        + 1
}

/// Lines of the table rows within `start..end`, header first.
fn row_lines(source: &str, start: usize, end: usize) -> Vec<usize> {
    let Some(table_text) = source.get(start..end) else {
        return Vec::new();
    };
    let first = line_of(source, start);
    table_text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with('|'))
        .map(|(i, _)| first + i)
        .collect()
}
