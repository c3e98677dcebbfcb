//! Tokenizer for the subset of Python needed to find import statements.
//!
//! The lexer understands everything that can hide or fake an `import`
//! keyword: comments, every string literal form (prefixes, triple quotes,
//! escapes), line continuations and bracket nesting. Newlines inside
//! brackets are implicit joins and produce no token.

use crate::error::{PyportError, Result};

/// A lexical token. Only the shapes the import scanner cares about are
/// distinguished; everything else collapses into [`Token::Op`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Name(String),
    Dot,
    Comma,
    Star,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Str,
    Number,
    Op,
    Newline,
    Eof,
}

impl Token {
    /// Whether this token ends a simple statement.
    pub fn ends_statement(&self) -> bool {
        matches!(self, Token::Newline | Token::Semicolon | Token::Eof)
    }
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Converts Python source text into [`Spanned`] tokens.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    brackets: Vec<(char, usize, usize)>,
    tokens: Vec<Spanned>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole source. The result always ends with
    /// `Newline, Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>> {
        while let Some(c) = self.peek(0) {
            let (line, column) = (self.line, self.column);
            match c {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.advance();
                }
                '#' => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                '\\' => {
                    self.advance();
                    if self.peek(0) == Some('\r') {
                        self.advance();
                    }
                    match self.peek(0) {
                        Some('\n') => {
                            self.advance();
                        }
                        None => {
                            return Err(PyportError::parse(
                                line,
                                column,
                                "unexpected EOF after line continuation character",
                            ))
                        }
                        Some(_) => {
                            return Err(PyportError::parse(
                                line,
                                column,
                                "unexpected character after line continuation character",
                            ))
                        }
                    }
                }
                '\n' => {
                    self.advance();
                    if self.brackets.is_empty() {
                        self.push_newline(line, column);
                    }
                }
                '"' | '\'' => self.string(false, line, column)?,
                c if is_ident_start(c) => self.name_or_prefixed_string(line, column)?,
                c if c.is_ascii_digit() => self.number(line, column),
                '.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.number(line, column)
                }
                '.' => self.single(Token::Dot, line, column),
                ',' => self.single(Token::Comma, line, column),
                ';' => self.single(Token::Semicolon, line, column),
                '*' => {
                    if self.peek(1) == Some('*') {
                        self.advance();
                        self.single(Token::Op, line, column);
                    } else {
                        self.single(Token::Star, line, column);
                    }
                }
                ':' => {
                    if self.peek(1) == Some('=') {
                        self.advance();
                        self.single(Token::Op, line, column);
                    } else {
                        self.single(Token::Colon, line, column);
                    }
                }
                '(' | '[' | '{' => {
                    self.brackets.push((c, line, column));
                    let token = match c {
                        '(' => Token::LParen,
                        '[' => Token::LBracket,
                        _ => Token::LBrace,
                    };
                    self.single(token, line, column);
                }
                ')' | ']' | '}' => {
                    self.close_bracket(c, line, column)?;
                    let token = match c {
                        ')' => Token::RParen,
                        ']' => Token::RBracket,
                        _ => Token::RBrace,
                    };
                    self.single(token, line, column);
                }
                '+' | '-' | '/' | '%' | '@' | '&' | '|' | '^' | '~' | '<' | '>' | '=' | '!' => {
                    self.single(Token::Op, line, column)
                }
                other => {
                    return Err(PyportError::parse(
                        line,
                        column,
                        format!("invalid character '{}' (U+{:04X})", other, other as u32),
                    ))
                }
            }
        }

        if let Some(&(open, line, column)) = self.brackets.first() {
            return Err(PyportError::parse(
                line,
                column,
                format!("'{}' was never closed", open),
            ));
        }

        let (line, column) = (self.line, self.column);
        self.push_newline(line, column);
        self.tokens.push(Spanned {
            token: Token::Eof,
            line,
            column,
        });
        Ok(self.tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn single(&mut self, token: Token, line: usize, column: usize) {
        self.advance();
        self.tokens.push(Spanned {
            token,
            line,
            column,
        });
    }

    fn push_newline(&mut self, line: usize, column: usize) {
        let redundant = self
            .tokens
            .last()
            .is_none_or(|t| t.token == Token::Newline);
        if !redundant {
            self.tokens.push(Spanned {
                token: Token::Newline,
                line,
                column,
            });
        }
    }

    fn close_bracket(&mut self, close: char, line: usize, column: usize) -> Result<()> {
        let Some((open, _, _)) = self.brackets.pop() else {
            return Err(PyportError::parse(
                line,
                column,
                format!("unmatched '{}'", close),
            ));
        };
        let expected = match open {
            '(' => ')',
            '[' => ']',
            _ => '}',
        };
        if close != expected {
            return Err(PyportError::parse(
                line,
                column,
                format!(
                    "closing parenthesis '{}' does not match opening parenthesis '{}'",
                    close, open
                ),
            ));
        }
        Ok(())
    }

    fn name_or_prefixed_string(&mut self, line: usize, column: usize) -> Result<()> {
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_continue) {
            self.advance();
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(0), Some('"' | '\'')) && is_string_prefix(&name) {
            return self.string(is_formatted_prefix(&name), line, column);
        }

        self.tokens.push(Spanned {
            token: Token::Name(name),
            line,
            column,
        });
        Ok(())
    }

    /// Consume a string literal starting at the opening quote and push one
    /// [`Token::Str`] for it.
    fn string(&mut self, formatted: bool, line: usize, column: usize) -> Result<()> {
        self.skip_string(formatted, line, column)?;
        self.tokens.push(Spanned {
            token: Token::Str,
            line,
            column,
        });
        Ok(())
    }

    /// Skip a string literal. Escapes are skipped for every prefix: even
    /// raw strings cannot end on `\"`. In f-strings, replacement fields
    /// are skipped as expressions and may hold strings using the same
    /// quote.
    fn skip_string(&mut self, formatted: bool, line: usize, column: usize) -> Result<()> {
        let quote = self.advance().unwrap_or('"');
        let triple = self.peek(0) == Some(quote) && self.peek(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }
        let mut fields: Vec<Field> = Vec::new();

        loop {
            let Some(c) = self.peek(0) else {
                let kind = if triple {
                    "unterminated triple-quoted string literal"
                } else {
                    "unterminated string literal"
                };
                return Err(PyportError::parse(
                    line,
                    column,
                    format!("{} (detected at line {})", kind, self.line),
                ));
            };

            if let Some(field) = fields.last_mut().filter(|f| !f.in_spec) {
                match c {
                    '"' | '\'' => self.skip_string(false, self.line, self.column)?,
                    c if is_ident_start(c) => self.skip_name_or_string()?,
                    '(' | '[' | '{' => {
                        field.brackets += 1;
                        self.advance();
                    }
                    ')' | ']' => {
                        field.brackets = field.brackets.saturating_sub(1);
                        self.advance();
                    }
                    '}' if field.brackets == 0 => {
                        fields.pop();
                        self.advance();
                    }
                    '}' => {
                        field.brackets -= 1;
                        self.advance();
                    }
                    ':' if field.brackets == 0 => {
                        field.in_spec = true;
                        self.advance();
                    }
                    _ => {
                        self.advance();
                    }
                }
                continue;
            }

            match c {
                '\\' => {
                    self.advance();
                    if self.peek(0) == Some('\r') && self.peek(1) == Some('\n') {
                        self.advance();
                    }
                    self.advance();
                }
                '\n' if !triple => {
                    return Err(PyportError::parse(
                        line,
                        column,
                        format!("unterminated string literal (detected at line {})", self.line),
                    ));
                }
                '{' if formatted && fields.is_empty() && self.peek(1) == Some('{') => {
                    self.advance();
                    self.advance();
                }
                '{' if formatted => {
                    fields.push(Field::default());
                    self.advance();
                }
                '}' if !fields.is_empty() => {
                    fields.pop();
                    self.advance();
                }
                c if c == quote && fields.is_empty() => {
                    self.advance();
                    if !triple {
                        break;
                    }
                    if self.peek(0) == Some(quote) && self.peek(1) == Some(quote) {
                        self.advance();
                        self.advance();
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Inside an f-string replacement field: skip a name, or a prefixed
    /// string when the name is a string prefix.
    fn skip_name_or_string(&mut self) -> Result<()> {
        let (line, column) = (self.line, self.column);
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_continue) {
            self.advance();
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if matches!(self.peek(0), Some('"' | '\'')) && is_string_prefix(&name) {
            self.skip_string(is_formatted_prefix(&name), line, column)?;
        }
        Ok(())
    }

    fn number(&mut self, line: usize, column: usize) {
        while let Some(c) = self.peek(0) {
            let exponent_sign =
                matches!(c, '+' | '-') && matches!(self.chars.get(self.pos - 1), Some('e' | 'E'));
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                self.advance();
            } else {
                break;
            }
        }
        self.tokens.push(Spanned {
            token: Token::Number,
            line,
            column,
        });
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// State of one open f-string replacement field.
#[derive(Debug, Default)]
struct Field {
    /// Brackets opened inside the field's expression.
    brackets: usize,
    /// Past the top-level `:`, in the format spec.
    in_spec: bool,
}

fn is_formatted_prefix(prefix: &str) -> bool {
    prefix.chars().any(|c| matches!(c, 'f' | 'F' | 't' | 'T'))
}

fn is_string_prefix(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "t" | "br" | "rb" | "fr" | "rf" | "tr" | "rt"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn error_message(source: &str) -> String {
        match Lexer::new(source).tokenize() {
            Err(PyportError::Parse { message, .. }) => message,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn tokenizes_simple_import() {
        assert_eq!(
            tokens("import os.path\n"),
            vec![
                Token::Name("import".into()),
                Token::Name("os".into()),
                Token::Dot,
                Token::Name("path".into()),
                Token::Newline,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_produce_no_tokens() {
        assert_eq!(
            tokens("# import requests\n"),
            vec![Token::Eof],
        );
    }

    #[test]
    fn strings_hide_their_contents() {
        let toks = tokens("x = 'import os'\ny = \"\"\"\nimport sys\n\"\"\"\n");
        assert!(!toks.contains(&Token::Name("os".into())));
        assert!(!toks.contains(&Token::Name("sys".into())));
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 2);
    }

    #[test]
    fn prefixed_strings_are_strings() {
        let toks = tokens("a = rb'\\d' + f\"{x}\" + Rb'''z'''\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 3);
        assert!(!toks.contains(&Token::Name("rb".into())));
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let toks = tokens("s = 'it\\'s'\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 1);
    }

    #[test]
    fn continued_string_in_crlf_file() {
        let toks = tokens("s = 'abc\\\r\ndef'\r\nimport os\r\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 1);
        assert!(toks.contains(&Token::Name("os".into())));
    }

    #[test]
    fn fstring_field_may_reuse_outer_quote() {
        let toks = tokens("x = f\"{'\"'}\" + f'{d[\"k\"]!r:>{w}}'\nimport os\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 2);
        assert!(toks.contains(&Token::Name("os".into())));
    }

    #[test]
    fn fstring_fields_hide_their_contents() {
        let toks = tokens("x = f\"{ {'a': 'import sys'}['a'] } {{literal}}\"\n");
        assert!(!toks.contains(&Token::Name("sys".into())));
        assert!(!toks.contains(&Token::Name("literal".into())));
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 1);
    }

    #[test]
    fn plain_string_braces_are_text() {
        let toks = tokens("x = '{' + \"}\"\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Str).count(), 2);
    }

    #[test]
    fn unterminated_fstring_field_is_an_error() {
        assert!(error_message("x = f'{y'\n").contains("unterminated"));
    }

    #[test]
    fn newlines_inside_brackets_are_joined() {
        let toks = tokens("from a import (\n  b,\n  c,\n)\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Newline).count(), 1);
    }

    #[test]
    fn line_continuation_joins_lines() {
        let toks = tokens("import a, \\\n    b\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Newline).count(), 1);
    }

    #[test]
    fn walrus_and_power_are_operators() {
        let toks = tokens("if (n := 2 ** 3): pass\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Colon).count(), 1);
        assert!(!toks.contains(&Token::Star));
    }

    #[test]
    fn unicode_identifiers_are_names() {
        let toks = tokens("café = 1\n");
        assert_eq!(toks[0], Token::Name("café".into()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(error_message("x = 'abc\n").contains("unterminated string literal"));
    }

    #[test]
    fn unterminated_triple_string_is_an_error() {
        assert!(error_message("x = \"\"\"abc\n\n").contains("triple-quoted"));
    }

    #[test]
    fn unmatched_closing_bracket_is_an_error() {
        assert_eq!(error_message("x = 1)\n"), "unmatched ')'");
    }

    #[test]
    fn mismatched_bracket_is_an_error() {
        assert!(error_message("x = (1]\n").contains("does not match"));
    }

    #[test]
    fn unclosed_bracket_reports_opening_position() {
        match Lexer::new("a = 1\nb = [1,\n2\n").tokenize() {
            Err(PyportError::Parse {
                line,
                column,
                message,
            }) => {
                assert_eq!((line, column), (2, 5));
                assert_eq!(message, "'[' was never closed");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_character_is_an_error() {
        assert!(error_message("x = $y\n").contains("invalid character '$'"));
    }

    #[test]
    fn stray_backslash_is_an_error() {
        assert!(error_message("x = 1 \\ 2\n").contains("line continuation"));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        assert_eq!(tokens("\u{feff}import os")[1], Token::Name("os".into()));
    }
}
