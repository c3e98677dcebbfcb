//! Append-only error log.

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends timestamped lines to a log file.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` stamped with the local time.
    pub fn append(&self, message: &str) -> Result<()> {
        self.append_at(Local::now().naive_local(), message)
    }

    /// Append `message` stamped with `when`.
    pub fn append_at(&self, when: NaiveDateTime, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_entry(when, message).as_bytes())?;
        Ok(())
    }

    /// Append, logging instead of failing. For use while already reporting
    /// another error.
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::warn!("Could not write to {}: {}", self.path.display(), e);
        }
    }
}

/// `[YYYY-mm-dd HH:MM:SS] message\n`
pub fn format_entry(when: NaiveDateTime, message: &str) -> String {
    format!("[{}] {}\n", when.format(TIMESTAMP_FORMAT), message)
}
