//! Case-insensitive literal search and replace in script text.
//!
//! The needle is matched literally (regex metacharacters are escaped).
//! [`Searcher`] remembers where the last match ended and wraps around to the
//! start of the text when nothing follows.

use regex::{NoExpand, Regex, RegexBuilder};

use crate::error::{PyportError, Result};

/// A match in the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Byte offsets.
    pub start: usize,
    pub end: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

/// A compiled search for one needle.
#[derive(Debug, Clone)]
pub struct TextSearch {
    pattern: Regex,
}

impl TextSearch {
    pub fn new(needle: &str) -> Result<Self> {
        if needle.is_empty() {
            return Err(PyportError::Other(anyhow::anyhow!("search text is empty")));
        }
        let pattern = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
            .map_err(|e| PyportError::Other(anyhow::anyhow!("invalid search text: {}", e)))?;
        Ok(Self { pattern })
    }

    /// First match at or after `cursor`, wrapping to the start of `text`.
    pub fn find_next(&self, text: &str, cursor: usize) -> Option<Match> {
        let start = char_boundary_at_or_after(text, cursor);
        self.pattern
            .find_at(text, start)
            .or_else(|| self.pattern.find(text))
            .map(|m| locate(text, m.start(), m.end()))
    }

    /// Every match, in order.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        self.pattern
            .find_iter(text)
            .map(|m| locate(text, m.start(), m.end()))
            .collect()
    }

    /// Replace every match with `replacement`, taken literally. Returns the
    /// new text and how many replacements were made.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        let count = self.pattern.find_iter(text).count();
        let replaced = self.pattern.replace_all(text, NoExpand(replacement));
        (replaced.into_owned(), count)
    }
}

/// A search with a cursor.
#[derive(Debug, Clone)]
pub struct Searcher {
    search: TextSearch,
    cursor: usize,
}

impl Searcher {
    pub fn new(needle: &str) -> Result<Self> {
        Ok(Self {
            search: TextSearch::new(needle)?,
            cursor: 0,
        })
    }

    /// Start searching from `cursor` instead of the beginning.
    pub fn starting_at(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Next match; the cursor moves past it.
    pub fn next_match(&mut self, text: &str) -> Option<Match> {
        let found = self.search.find_next(text, self.cursor)?;
        self.cursor = found.end;
        Some(found)
    }
}

fn char_boundary_at_or_after(text: &str, offset: usize) -> usize {
    if offset >= text.len() {
        return text.len();
    }
    (offset..=text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(text.len())
}

fn locate(text: &str, start: usize, end: usize) -> Match {
    let before = &text[..start];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = text[line_start..start].chars().count() + 1;
    Match {
        start,
        end,
        line,
        column,
    }
}
