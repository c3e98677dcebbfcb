//! Static import extraction for Python source.
//!
//! [`extract_imports`] returns the distinct top-level module names that a
//! script references through `import` or `from ... import` statements. The
//! source is tokenized and scanned, never executed.
//!
//! # Example
//!
//! ```
//! use pyport::imports::extract_imports;
//!
//! let imports = extract_imports("import a.b.c\nfrom x.y import z\nfrom . import w\n").unwrap();
//! let names: Vec<&str> = imports.iter().collect();
//! assert_eq!(names, vec!["a", "x"]);
//! ```

mod lexer;
mod scanner;

use std::collections::BTreeSet;

use crate::error::Result;

pub use lexer::{Lexer, Spanned, Token};
pub use scanner::ImportRef;

use scanner::ImportScanner;

/// The set of top-level module names a source text imports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    names: BTreeSet<String>,
}

impl ImportSet {
    /// Iterate names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for ImportSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ImportSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Every import reference in `source`, in source order, relative ones
/// included.
pub fn scan_imports(source: &str) -> Result<Vec<ImportRef>> {
    let tokens = Lexer::new(source).tokenize()?;
    ImportScanner::new(tokens).scan()
}

/// Distinct top-level names of the absolute imports in `source`.
pub fn extract_imports(source: &str) -> Result<ImportSet> {
    let refs = scan_imports(source)?;
    let set: ImportSet = refs
        .iter()
        .filter_map(|r| r.top_level().map(str::to_string))
        .collect();
    tracing::debug!("Extracted {} top-level imports", set.len());
    Ok(set)
}
