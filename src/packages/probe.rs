//! Installed-module detection.
//!
//! A probe asks the configured interpreter, in a child process, whether a
//! top-level module can be found. Two strategies exist:
//!
//! - [`ProbeMode::FindSpec`] locates the module with
//!   `importlib.util.find_spec` and never runs its code.
//! - [`ProbeMode::Import`] really imports it. Module-level initialization
//!   runs (inside the child), so a module that fails while initializing is
//!   reported as [`ProbeOutcome::Failed`] and treated as missing.
//!
//! # Example
//!
//! ```no_run
//! use pyport::packages::probe::{InterpreterProbe, ModuleProbe, ProbeMode};
//!
//! let probe = InterpreterProbe::new("/media/usb/PPython/python.exe", ProbeMode::FindSpec);
//! if !probe.is_available("requests") {
//!     println!("requests needs installing");
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::shell::{execute_quiet, CommandResult, ProcessCommand};

const FIND_SPEC_SCRIPT: &str = "\
import importlib.util, sys
try:
    spec = importlib.util.find_spec(sys.argv[1])
except Exception as exc:
    print(repr(exc), file=sys.stderr)
    sys.exit(2)
sys.exit(0 if spec is not None else 1)
";

const IMPORT_SCRIPT: &str = "\
import importlib, sys
try:
    importlib.import_module(sys.argv[1])
except ImportError:
    sys.exit(1)
except BaseException as exc:
    print(repr(exc), file=sys.stderr)
    sys.exit(2)
";

/// How modules are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Locate the module without executing it.
    #[default]
    FindSpec,
    /// Import the module in a child interpreter.
    Import,
}

/// The result of probing one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The module can be imported.
    Available,
    /// The module is not installed.
    Missing,
    /// The probe itself failed (initialization error, interpreter not
    /// runnable). Counts as missing.
    Failed { reason: String },
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available)
    }
}

/// Something that can tell whether a module is importable.
pub trait ModuleProbe: Send + Sync {
    /// Probe a single top-level module name.
    fn probe(&self, module: &str) -> ProbeOutcome;

    /// Whether `module` is importable.
    fn is_available(&self, module: &str) -> bool {
        self.probe(module).is_available()
    }
}

/// Probes modules by running the configured interpreter.
#[derive(Debug, Clone)]
pub struct InterpreterProbe {
    interpreter: PathBuf,
    mode: ProbeMode,
}

impl InterpreterProbe {
    pub fn new(interpreter: impl Into<PathBuf>, mode: ProbeMode) -> Self {
        Self {
            interpreter: interpreter.into(),
            mode,
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    fn command(&self, module: &str) -> ProcessCommand {
        let script = match self.mode {
            ProbeMode::FindSpec => FIND_SPEC_SCRIPT,
            ProbeMode::Import => IMPORT_SCRIPT,
        };
        ProcessCommand::new(&self.interpreter)
            .arg("-c")
            .arg(script)
            .arg(module)
    }
}

impl ModuleProbe for InterpreterProbe {
    fn probe(&self, module: &str) -> ProbeOutcome {
        let outcome = match execute_quiet(&self.command(module)) {
            Ok(result) => outcome_from_result(&result),
            Err(e) => ProbeOutcome::Failed {
                reason: e.to_string(),
            },
        };
        tracing::debug!("Probe {:?} {}: {:?}", self.mode, module, outcome);
        outcome
    }
}

/// Map a probe process result to an outcome: 0 available, 1 missing,
/// anything else a failed probe.
pub fn outcome_from_result(result: &CommandResult) -> ProbeOutcome {
    match result.exit_code {
        Some(0) => ProbeOutcome::Available,
        Some(1) => ProbeOutcome::Missing,
        code => {
            let stderr = result.stderr.trim();
            let reason = if stderr.is_empty() {
                format!("probe exited with status {:?}", code)
            } else {
                stderr.to_string()
            };
            ProbeOutcome::Failed { reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(code: Option<i32>, stderr: &str) -> CommandResult {
        if code == Some(0) {
            CommandResult::success(String::new(), stderr.to_string(), Duration::ZERO)
        } else {
            CommandResult::failure(code, String::new(), stderr.to_string(), Duration::ZERO)
        }
    }

    #[test]
    fn exit_zero_is_available() {
        assert_eq!(outcome_from_result(&result(Some(0), "")), ProbeOutcome::Available);
    }

    #[test]
    fn exit_one_is_missing() {
        assert_eq!(outcome_from_result(&result(Some(1), "")), ProbeOutcome::Missing);
    }

    #[test]
    fn other_exits_are_failed_probes() {
        let outcome = outcome_from_result(&result(Some(2), "RuntimeError('no display')\n"));
        assert_eq!(
            outcome,
            ProbeOutcome::Failed {
                reason: "RuntimeError('no display')".to_string()
            }
        );
        assert!(!outcome.is_available());
    }

    #[test]
    fn killed_probe_is_failed() {
        let outcome = outcome_from_result(&result(None, ""));
        assert!(matches!(outcome, ProbeOutcome::Failed { .. }));
    }

    #[test]
    fn unrunnable_interpreter_is_failed() {
        let probe = InterpreterProbe::new("/no/such/python", ProbeMode::FindSpec);
        assert!(matches!(probe.probe("os"), ProbeOutcome::Failed { .. }));
        assert!(!probe.is_available("os"));
    }

    #[test]
    fn command_passes_module_as_argument() {
        let probe = InterpreterProbe::new("python3", ProbeMode::Import);
        let cmd = probe.command("numpy");
        let args = cmd.arguments();
        assert_eq!(args[0], "-c");
        assert!(args[1].to_string_lossy().contains("import_module"));
        assert_eq!(args[2], "numpy");
    }

    #[test]
    fn find_spec_mode_does_not_import() {
        let probe = InterpreterProbe::new("python3", ProbeMode::FindSpec);
        let cmd = probe.command("numpy");
        let script = cmd.arguments()[1].to_string_lossy().into_owned();
        assert!(script.contains("find_spec"));
        assert!(!script.contains("import_module"));
    }

    #[test]
    fn probe_mode_deserializes_snake_case() {
        let mode: ProbeMode = serde_yaml::from_str("import").unwrap();
        assert_eq!(mode, ProbeMode::Import);
        let mode: ProbeMode = serde_yaml::from_str("find_spec").unwrap();
        assert_eq!(mode, ProbeMode::FindSpec);
    }

    #[cfg(unix)]
    #[test]
    fn fake_interpreter_reports_by_exit_code() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let python = temp.path().join("python");
        std::fs::write(
            &python,
            "#!/bin/sh\ncase \"$3\" in\n  os) exit 0 ;;\n  broken) echo 'boom' >&2; exit 2 ;;\n  *) exit 1 ;;\nesac\n",
        )
        .unwrap();
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = InterpreterProbe::new(&python, ProbeMode::Import);
        assert_eq!(probe.probe("os"), ProbeOutcome::Available);
        assert_eq!(probe.probe("requests"), ProbeOutcome::Missing);
        assert_eq!(
            probe.probe("broken"),
            ProbeOutcome::Failed {
                reason: "boom".to_string()
            }
        );
    }
}
