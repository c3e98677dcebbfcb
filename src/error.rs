//! Error types for pyport operations.
//!
//! This module defines [`PyportError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `PyportError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `PyportError::Other`) for unexpected errors
//! - Every external action is caught at its call site and rendered; only a
//!   missing interpreter stops the program at startup

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pyport operations.
#[derive(Debug, Error)]
pub enum PyportError {
    /// Python source could not be tokenized or an import statement is malformed.
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// An external tool exited with a non-zero status.
    #[error("Command failed with exit code {code:?}: {command}\n{stderr}")]
    ProcessFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external tool could not be started or waited on.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// No interpreter was selected on the command line or in the settings file.
    #[error("No valid interpreter selected: {message}")]
    InterpreterNotConfigured { message: String },

    /// The selected interpreter path does not contain a Python executable.
    #[error("No Python executable found in {path}")]
    InterpreterNotFound { path: PathBuf },

    /// Failed to parse the settings file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid settings structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// pip produced output that could not be decoded.
    #[error("Unexpected pip output: {message}")]
    PipOutput { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PyportError {
    /// Build a parse error at a 1-based position.
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Whether this error means there is no usable interpreter.
    pub fn is_interpreter_error(&self) -> bool {
        matches!(
            self,
            Self::InterpreterNotConfigured { .. } | Self::InterpreterNotFound { .. }
        )
    }
}

/// Result type alias for pyport operations.
pub type Result<T> = std::result::Result<T, PyportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_displays_position_and_message() {
        let err = PyportError::parse(3, 7, "unterminated string literal");
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("column 7"));
        assert!(msg.contains("unterminated string literal"));
    }

    #[test]
    fn process_failed_displays_command_and_stderr() {
        let err = PyportError::ProcessFailed {
            command: "python -m pip install nope".into(),
            code: Some(1),
            stderr: "ERROR: No matching distribution found for nope".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pip install nope"));
        assert!(msg.contains("No matching distribution"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = PyportError::CommandFailed {
            command: "python -m pdb".into(),
            code: None,
        };
        assert!(err.to_string().contains("python -m pdb"));
    }

    #[test]
    fn interpreter_not_configured_displays_message() {
        let err = PyportError::InterpreterNotConfigured {
            message: "run 'pyport interpreter set <path>'".into(),
        };
        assert!(err.to_string().contains("interpreter set"));
    }

    #[test]
    fn interpreter_not_found_displays_path() {
        let err = PyportError::InterpreterNotFound {
            path: PathBuf::from("/media/usb/PPython"),
        };
        assert!(err.to_string().contains("/media/usb/PPython"));
    }

    #[test]
    fn interpreter_errors_are_recognised() {
        assert!(PyportError::InterpreterNotFound {
            path: PathBuf::from("/x")
        }
        .is_interpreter_error());
        assert!(!PyportError::parse(1, 1, "x").is_interpreter_error());
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = PyportError::ConfigParseError {
            path: PathBuf::from("/config/pyport.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config/pyport.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: PyportError = io_err.into();
        assert!(matches!(err, PyportError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(PyportError::PipOutput {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
