//! Statement-level scan for `import` and `from ... import` statements.
//!
//! The scanner walks the token stream one simple statement at a time. A
//! compound statement header (`if`, `def`, `try`, ...) is skipped up to its
//! block colon, after which whatever follows on the same line is scanned as
//! a fresh statement. Every other statement is skipped whole, so nesting
//! depth never matters.

use crate::error::{PyportError, Result};

use super::lexer::{Spanned, Token};

const COMPOUND_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "while", "for", "try", "except", "finally", "with", "def", "class",
    "async", "match", "case",
];

const HARD_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// One module reference found in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Dotted module path as written (`a.b.c`). Empty for `from . import x`.
    pub module: String,
    /// Number of leading dots; 0 for absolute imports.
    pub level: usize,
    /// 1-based line of the module path.
    pub line: usize,
}

impl ImportRef {
    /// First dotted segment of an absolute import; `None` for relative ones.
    pub fn top_level(&self) -> Option<&str> {
        if self.level > 0 || self.module.is_empty() {
            return None;
        }
        self.module.split('.').next()
    }

    pub fn is_relative(&self) -> bool {
        self.level > 0
    }
}

pub(crate) struct ImportScanner {
    tokens: Vec<Spanned>,
    pos: usize,
    refs: Vec<ImportRef>,
}

impl ImportScanner {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            refs: Vec::new(),
        }
    }

    pub fn scan(mut self) -> Result<Vec<ImportRef>> {
        while self.current() != &Token::Eof {
            self.statement()?;
        }
        Ok(self.refs)
    }

    fn statement(&mut self) -> Result<()> {
        match self.current().clone() {
            Token::Newline | Token::Semicolon => {
                self.bump();
                Ok(())
            }
            Token::Name(name) if name == "import" => self.regular_import(),
            Token::Name(name) if name == "from" => self.from_import(),
            Token::Name(name) if COMPOUND_KEYWORDS.contains(&name.as_str()) => {
                self.skip_header();
                Ok(())
            }
            _ => {
                self.skip_statement();
                Ok(())
            }
        }
    }

    fn regular_import(&mut self) -> Result<()> {
        self.bump();
        loop {
            if self.current() == &Token::LParen {
                return Err(self.error_here(
                    "parentheses are not allowed around a plain import; use 'from ... import (...)'",
                ));
            }
            let (module, line) = self.dotted_name("expected module name after 'import'")?;
            self.optional_alias()?;
            self.refs.push(ImportRef {
                module,
                level: 0,
                line,
            });

            if self.current() != &Token::Comma {
                break;
            }
            self.bump();
            if self.current().ends_statement() {
                return Err(self.error_here(
                    "trailing comma not allowed without surrounding parentheses",
                ));
            }
        }
        self.expect_end_of_statement()
    }

    fn from_import(&mut self) -> Result<()> {
        let from_line = self.spanned().line;
        self.bump();

        let mut level = 0;
        while self.current() == &Token::Dot {
            level += 1;
            self.bump();
        }

        let (module, line) = match self.current().clone() {
            Token::Name(name) if name != "import" => {
                self.dotted_name("expected module name after 'from'")?
            }
            _ if level == 0 => {
                return Err(self.error_here("expected module name after 'from'"));
            }
            _ => (String::new(), from_line),
        };

        if !self.is_name("import") {
            return Err(self.error_here("expected 'import'"));
        }
        self.bump();

        match self.current().clone() {
            Token::Star => self.bump(),
            Token::LParen => {
                self.bump();
                self.imported_names(true)?;
                if self.current() != &Token::RParen {
                    return Err(self.error_here("expected ')'"));
                }
                self.bump();
            }
            _ => self.imported_names(false)?,
        }

        self.refs.push(ImportRef {
            module,
            level,
            line,
        });
        self.expect_end_of_statement()
    }

    /// `name [as alias] (, name [as alias])*`, with a trailing comma only
    /// when parenthesized.
    fn imported_names(&mut self, parenthesized: bool) -> Result<()> {
        loop {
            self.identifier("expected name after 'import'")?;
            self.optional_alias()?;

            if self.current() != &Token::Comma {
                return Ok(());
            }
            self.bump();

            let closed = parenthesized && self.current() == &Token::RParen;
            if closed {
                return Ok(());
            }
            if self.current().ends_statement() {
                return Err(self.error_here(
                    "trailing comma not allowed without surrounding parentheses",
                ));
            }
        }
    }

    fn dotted_name(&mut self, message: &str) -> Result<(String, usize)> {
        let line = self.spanned().line;
        let mut path = self.identifier(message)?;
        while self.current() == &Token::Dot {
            self.bump();
            let segment = self.identifier("expected name after '.'")?;
            path.push('.');
            path.push_str(&segment);
        }
        Ok((path, line))
    }

    fn optional_alias(&mut self) -> Result<()> {
        if self.is_name("as") {
            self.bump();
            self.identifier("expected name after 'as'")?;
        }
        Ok(())
    }

    fn identifier(&mut self, message: &str) -> Result<String> {
        match self.current().clone() {
            Token::Name(name) if !HARD_KEYWORDS.contains(&name.as_str()) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.error_here(message)),
        }
    }

    fn expect_end_of_statement(&mut self) -> Result<()> {
        if self.current().ends_statement() {
            Ok(())
        } else {
            Err(self.error_here("invalid syntax"))
        }
    }

    /// Skip a compound header through its block colon. Brackets are already
    /// balanced by the lexer, so depth only has to be counted here.
    fn skip_header(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current().clone() {
                Token::Eof | Token::Newline => return,
                Token::Semicolon if depth == 0 => return,
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                Token::Colon if depth == 0 => {
                    self.bump();
                    return;
                }
                _ => {}
            }
            self.bump();
        }
    }

    fn skip_statement(&mut self) {
        while !self.current().ends_statement() {
            self.bump();
        }
    }

    fn spanned(&self) -> &Spanned {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current(&self) -> &Token {
        &self.spanned().token
    }

    fn is_name(&self, expected: &str) -> bool {
        matches!(self.current(), Token::Name(name) if name == expected)
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn error_here(&self, message: &str) -> PyportError {
        let at = self.spanned();
        PyportError::parse(at.line, at.column, message)
    }
}
