//! Parameter types recognised inside `{...}` and their regex fragments.

/// Kind of value a step expression parameter captures.
///
/// The cucumber built-ins `{int}`, `{float}`, `{word}` and `{string}` get
/// dedicated fragments. `{}` matches anything. Any other name is a named
/// parameter whose optional `:hint` selects a numeric fragment.
///
/// # Examples
/// ```
/// use gherkin_suite_patterns::ParameterKind;
/// assert_eq!(ParameterKind::from_placeholder("int", None), ParameterKind::Int);
/// assert_eq!(ParameterKind::from_placeholder("", None), ParameterKind::Anonymous);
/// assert_eq!(ParameterKind::Int.regex_fragment(), r"-?\d+");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// `{int}`: an optionally negative integer.
    Int,
    /// `{float}`: a decimal number with optional exponent.
    Float,
    /// `{word}`: a run of non-whitespace characters.
    Word,
    /// `{string}`: a single- or double-quoted string.
    String,
    /// `{}`: any text, including nothing.
    Anonymous,
    /// `{name}` or `{name:hint}`.
    Named {
        /// Parameter name as written.
        name: String,
        /// Optional type hint after the colon.
        hint: Option<String>,
    },
}

impl ParameterKind {
    /// Classify a parameter from its name and optional hint.
    #[must_use]
    pub fn from_placeholder(name: &str, hint: Option<&str>) -> Self {
        match (name, hint) {
            ("", None) => Self::Anonymous,
            ("int", None) => Self::Int,
            ("float", None) => Self::Float,
            ("word", None) => Self::Word,
            ("string", None) => Self::String,
            _ => Self::Named {
                name: name.to_owned(),
                hint: hint.map(str::to_owned),
            },
        }
    }

    /// Regular-expression fragment matching this parameter's text.
    ///
    /// The fragment contains no capturing groups; the compiler wraps it in
    /// exactly one.
    #[must_use]
    pub fn regex_fragment(&self) -> &'static str {
        match self {
            Self::Int => r"-?\d+",
            Self::Float => r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?",
            Self::Word => r"[^\s]+",
            Self::String => r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#,
            Self::Anonymous => r".*",
            Self::Named { hint, .. } => hint_fragment(hint.as_deref()),
        }
    }

    /// Turn captured text into the argument handed to a step definition.
    ///
    /// Quoted strings lose their delimiters and escapes; everything else is
    /// passed through.
    ///
    /// # Examples
    /// ```
    /// use gherkin_suite_patterns::ParameterKind;
    /// assert_eq!(ParameterKind::String.normalise(r#""say \"hi\"""#), r#"say "hi""#);
    /// assert_eq!(ParameterKind::Word.normalise("plain"), "plain");
    /// ```
    #[must_use]
    pub fn normalise(&self, raw: &str) -> String {
        if !matches!(self, Self::String) {
            return raw.to_owned();
        }
        let inner = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
            .unwrap_or(raw);
        unescape(inner)
    }
}

fn hint_fragment(hint: Option<&str>) -> &'static str {
    match hint {
        Some("u8" | "u16" | "u32" | "u64" | "u128" | "usize") => r"\d+",
        Some("i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "int") => r"[+-]?\d+",
        Some("f32" | "f64" | "float") => {
            r"(?i:(?:[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?|nan|inf|infinity))"
        }
        Some("word") => r"[^\s]+",
        _ => r".+?",
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("int", None, ParameterKind::Int)]
    #[case("float", None, ParameterKind::Float)]
    #[case("word", None, ParameterKind::Word)]
    #[case("string", None, ParameterKind::String)]
    #[case("", None, ParameterKind::Anonymous)]
    fn recognises_builtin_parameters(
        #[case] name: &str,
        #[case] hint: Option<&str>,
        #[case] expected: ParameterKind,
    ) {
        assert_eq!(ParameterKind::from_placeholder(name, hint), expected);
    }

    #[test]
    fn hinted_builtin_name_is_a_named_parameter() {
        let kind = ParameterKind::from_placeholder("int", Some("u8"));
        assert_eq!(kind.regex_fragment(), r"\d+");
    }

    #[rstest]
    #[case(Some("u64"), r"\d+")]
    #[case(Some("i32"), r"[+-]?\d+")]
    #[case(Some("Custom"), r".+?")]
    #[case(None, r".+?")]
    fn named_parameters_follow_their_hint(#[case] hint: Option<&str>, #[case] expected: &str) {
        let kind = ParameterKind::from_placeholder("value", hint);
        assert_eq!(kind.regex_fragment(), expected);
    }

    #[test]
    fn strips_single_quotes() {
        assert_eq!(ParameterKind::String.normalise("'it\\'s'"), "it's");
    }

    #[test]
    fn keeps_trailing_backslash() {
        assert_eq!(unescape("odd\\"), "odd\\");
    }
}
