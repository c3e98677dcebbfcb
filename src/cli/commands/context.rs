//! State shared by every command: the root folder and the interpreter
//! override from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{select, Interpreter, Settings};
use crate::error::Result;
use crate::jobs::Orchestrator;
use crate::packages::{InterpreterProbe, Pip};
use crate::workspace::ErrorLog;

#[derive(Debug, Clone)]
pub struct CommandContext {
    root: PathBuf,
    python: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(root: impl Into<PathBuf>, python: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            python,
        }
    }

    /// The drive or folder holding the portable installation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.root)
    }

    /// The interpreter for this run.
    pub fn interpreter(&self, settings: &Settings) -> Result<Interpreter> {
        select(self.python.as_deref(), settings)
    }

    pub fn pip(&self, settings: &Settings) -> Result<Pip> {
        Ok(Pip::new(self.interpreter(settings)?.executable))
    }

    /// An orchestrator probing with the configured mode and aliases.
    pub fn orchestrator(&self, settings: &Settings) -> Result<Orchestrator> {
        let interpreter = self.interpreter(settings)?.executable;
        let probe = InterpreterProbe::new(&interpreter, settings.probe);
        Ok(Orchestrator::new(
            interpreter,
            Arc::new(probe),
            settings.package_aliases(),
        ))
    }

    /// The error log named by the settings, or the default one when the
    /// settings cannot be read.
    pub fn error_log(&self) -> ErrorLog {
        let settings = self.settings().unwrap_or_default();
        ErrorLog::new(settings.error_log_path(&self.root))
    }

    /// Append `message` to the error log. Never fails.
    pub fn log_error(&self, message: &str) {
        self.error_log().record(message);
    }
}
