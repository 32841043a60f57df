//! Lexer splitting a step expression into literal text, parameters and
//! optional groups.

use crate::errors::{ExpressionError, placeholder_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Parameter {
        start: usize,
        name: String,
        hint: Option<String>,
    },
    Optional(String),
    StrayClose {
        index: usize,
    },
}

struct Lexer<'a> {
    bytes: &'a [u8],
    source: &'a str,
    pos: usize,
    literal: String,
    tokens: Vec<Token>,
}

pub(crate) fn lex_expression(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut lexer = Lexer {
        bytes: source.as_bytes(),
        source,
        pos: 0,
        literal: String::new(),
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), ExpressionError> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '\\' => self.escaped(),
                '{' => self.parameter()?,
                '}' => {
                    self.flush();
                    self.tokens.push(Token::StrayClose { index: self.pos });
                    self.pos += 1;
                }
                '(' => self.optional()?,
                other => {
                    self.literal.push(other);
                    self.pos += other.len_utf8();
                }
            }
        }
        self.flush();
        Ok(())
    }

    fn peek_char(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.tokens.push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn escaped(&mut self) {
        self.pos += 1;
        match self.peek_char() {
            Some(next) => {
                self.literal.push(next);
                self.pos += next.len_utf8();
            }
            None => self.literal.push('\\'),
        }
    }

    fn parameter(&mut self) -> Result<(), ExpressionError> {
        let start = self.pos;
        let mut index = start + 1;
        let mut name = String::new();
        while let Some(&b) = self.bytes.get(index) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                name.push(char::from(b));
                index += 1;
            } else {
                break;
            }
        }

        let mut hint = None;
        if self.bytes.get(index) == Some(&b':') {
            index += 1;
            let hint_start = index;
            while let Some(&b) = self.bytes.get(index) {
                if b == b'}' || b == b'{' || b.is_ascii_whitespace() {
                    break;
                }
                index += 1;
            }
            let raw = self.source.get(hint_start..index).unwrap_or_default();
            if raw.is_empty() {
                return Err(placeholder_error(
                    "empty type hint for parameter",
                    start,
                    Some(name),
                ));
            }
            hint = Some(raw.to_owned());
        }

        match self.bytes.get(index) {
            Some(b'}') => {}
            Some(_) => {
                return Err(placeholder_error(
                    "invalid parameter in step expression",
                    start,
                    Some(name),
                ));
            }
            None => {
                return Err(placeholder_error(
                    "missing closing '}' for parameter",
                    start,
                    Some(name),
                ));
            }
        }

        self.flush();
        self.tokens.push(Token::Parameter { start, name, hint });
        self.pos = index + 1;
        Ok(())
    }

    fn optional(&mut self) -> Result<(), ExpressionError> {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => return Err(ExpressionError::UnterminatedOptional { position: start }),
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('{') => return Err(ExpressionError::ParameterInOptional { position: start }),
                Some('\\') => {
                    self.pos += 1;
                    if let Some(next) = self.peek_char() {
                        text.push(next);
                        self.pos += next.len_utf8();
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        if text.is_empty() {
            return Err(ExpressionError::EmptyOptional { position: start });
        }
        self.flush();
        self.tokens.push(Token::Optional(text));
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise lexing fallibility")]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_parameters() {
        let tokens = lex_expression("I have {int} cukes").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("I have ".into()),
                Token::Parameter {
                    start: 7,
                    name: "int".into(),
                    hint: None,
                },
                Token::Literal(" cukes".into()),
            ]
        );
    }

    #[test]
    fn reads_type_hints() {
        let tokens = lex_expression("{count:u32}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Parameter {
                start: 0,
                name: "count".into(),
                hint: Some("u32".into()),
            }]
        );
    }

    #[test]
    fn lexes_anonymous_parameter() {
        let tokens = lex_expression("say {}").unwrap();
        assert_eq!(
            tokens.last(),
            Some(&Token::Parameter {
                start: 4,
                name: String::new(),
                hint: None,
            })
        );
    }

    #[test]
    fn escapes_make_braces_and_parentheses_literal() {
        let tokens = lex_expression(r"a \{b\} \(c\)").unwrap();
        assert_eq!(tokens, vec![Token::Literal("a {b} (c)".into())]);
    }

    #[test]
    fn collects_optional_text() {
        let tokens = lex_expression("cucumber(s)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("cucumber".into()),
                Token::Optional("s".into()),
            ]
        );
    }

    #[test]
    fn records_stray_closing_brace() {
        let tokens = lex_expression("oops}").unwrap();
        assert_eq!(tokens.last(), Some(&Token::StrayClose { index: 4 }));
    }

    #[test]
    fn rejects_parameters_inside_optional_text() {
        let err = lex_expression("a ({int})").unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::ParameterInOptional { position: 2 }
        ));
    }

    #[test]
    fn rejects_whitespace_inside_parameter() {
        let err = lex_expression("{my value}").unwrap_err();
        assert!(err.to_string().contains("invalid parameter"));
    }

    #[test]
    fn rejects_unclosed_parameter() {
        let err = lex_expression("{value").unwrap_err();
        assert!(err.to_string().contains("missing closing"));
    }
}
