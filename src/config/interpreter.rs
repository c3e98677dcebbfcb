//! Choosing the Python interpreter.
//!
//! The interpreter comes from `--python` (or `PYPORT_PYTHON`) when given,
//! otherwise from `python_path` in the settings file. Either may name the
//! executable itself or the folder of a portable installation.

use std::fmt;
use std::path::{Path, PathBuf};

use super::settings::Settings;
use crate::error::{PyportError, Result};
use crate::shell::python_executable_candidates;

/// Where the interpreter selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterSource {
    CommandLine,
    Settings,
}

impl fmt::Display for InterpreterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpreterSource::CommandLine => write!(f, "command line"),
            InterpreterSource::Settings => write!(f, "settings file"),
        }
    }
}

/// A resolved interpreter executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// The executable to run.
    pub executable: PathBuf,
    /// The path as configured, before resolution.
    pub configured: PathBuf,
    pub source: InterpreterSource,
}

/// Turn a folder or executable path into the executable.
pub fn resolve_executable(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        for candidate in python_executable_candidates() {
            let exe = path.join(candidate);
            if exe.is_file() {
                return Ok(exe);
            }
        }
    }
    Err(PyportError::InterpreterNotFound {
        path: path.to_path_buf(),
    })
}

/// Pick the interpreter for this run.
pub fn select(flag: Option<&Path>, settings: &Settings) -> Result<Interpreter> {
    let (configured, source) = match (flag, &settings.python_path) {
        (Some(path), _) => (path.to_path_buf(), InterpreterSource::CommandLine),
        (None, Some(path)) => (path.clone(), InterpreterSource::Settings),
        (None, None) => {
            return Err(PyportError::InterpreterNotConfigured {
                message: "pass --python <path> or run 'pyport interpreter set <path>'"
                    .to_string(),
            })
        }
    };

    let executable = resolve_executable(&configured)?;
    tracing::debug!(
        "Using interpreter {} (from {})",
        executable.display(),
        source
    );
    Ok(Interpreter {
        executable,
        configured,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn portable_install() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let relative = python_executable_candidates()[0];
        let exe = temp.path().join(relative);
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, "").unwrap();
        (temp, exe)
    }

    #[test]
    fn folder_resolves_to_executable() {
        let (temp, exe) = portable_install();
        assert_eq!(resolve_executable(temp.path()).unwrap(), exe);
    }

    #[test]
    fn executable_resolves_to_itself() {
        let (_temp, exe) = portable_install();
        assert_eq!(resolve_executable(&exe).unwrap(), exe);
    }

    #[test]
    fn empty_folder_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = resolve_executable(temp.path()).unwrap_err();
        assert!(matches!(err, PyportError::InterpreterNotFound { .. }));
    }

    #[test]
    fn nothing_configured_is_not_configured() {
        let err = select(None, &Settings::default()).unwrap_err();
        assert!(matches!(err, PyportError::InterpreterNotConfigured { .. }));
    }

    #[test]
    fn flag_wins_over_settings() {
        let (temp, exe) = portable_install();
        let settings = Settings {
            python_path: Some(PathBuf::from("/nowhere")),
            ..Settings::default()
        };
        let interpreter = select(Some(temp.path()), &settings).unwrap();
        assert_eq!(interpreter.executable, exe);
        assert_eq!(interpreter.source, InterpreterSource::CommandLine);
    }

    #[test]
    fn settings_used_without_flag() {
        let (temp, exe) = portable_install();
        let settings = Settings {
            python_path: Some(temp.path().to_path_buf()),
            ..Settings::default()
        };
        let interpreter = select(None, &settings).unwrap();
        assert_eq!(interpreter.executable, exe);
        assert_eq!(interpreter.source, InterpreterSource::Settings);
        assert_eq!(interpreter.configured, temp.path());
    }
}
