//! Running a script with the portable interpreter.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::shell::{execute_streaming, CommandOptions, CommandResult, OutputCallback, ProcessCommand};

/// Runs scripts, streaming their output.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: PathBuf,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// `<interpreter> <script> <args...>`, run from the script's folder.
    pub fn command(&self, script: &Path, args: &[String]) -> ProcessCommand {
        ProcessCommand::new(&self.interpreter)
            .arg(script.as_os_str())
            .args(args)
    }

    fn options(script: &Path) -> CommandOptions {
        let mut options = CommandOptions {
            cwd: script
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf),
            ..Default::default()
        };
        options
            .env
            .insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
        options
    }

    /// Run `script`, handing each output line to `callback` as it arrives.
    /// A non-zero exit is reported in the result, not as an error.
    pub fn run(
        &self,
        script: &Path,
        args: &[String],
        callback: OutputCallback,
    ) -> Result<CommandResult> {
        let script = absolute(script)?;
        let cmd = self.command(&script, args);
        tracing::info!("Running {}", script.display());
        let result = execute_streaming(&cmd, &Self::options(&script), callback)?;
        tracing::info!(
            "{} exited with {:?} after {:.1?}",
            script.display(),
            result.exit_code,
            result.duration
        );
        Ok(result)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::OutputLine;
    use std::sync::{Arc, Mutex};

    #[test]
    fn command_passes_script_and_args() {
        let runner = ScriptRunner::new("/drive/PPython/python.exe");
        let cmd = runner.command(Path::new("/drive/Saved Scripts/game.py"), &["--fast".to_string()]);
        assert_eq!(
            cmd.display(),
            "/drive/PPython/python.exe /drive/Saved Scripts/game.py --fast"
        );
    }

    #[test]
    fn options_run_from_script_folder_unbuffered() {
        let options = ScriptRunner::options(Path::new("/drive/Saved Scripts/game.py"));
        assert_eq!(options.cwd, Some(PathBuf::from("/drive/Saved Scripts")));
        assert_eq!(options.env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
    }

    #[cfg(unix)]
    #[test]
    fn run_streams_output_and_reports_exit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let python = temp.path().join("python");
        std::fs::write(
            &python,
            "#!/bin/sh\necho \"running $(basename \"$1\") in $(basename \"$(pwd)\")\"\necho oops >&2\nexit 4\n",
        )
        .unwrap();
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
        let scripts = temp.path().join("scripts");
        std::fs::create_dir_all(&scripts).unwrap();
        let script = scripts.join("game.py");
        std::fs::write(&script, "").unwrap();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let result = ScriptRunner::new(&python)
            .run(&script, &[], Box::new(move |l| sink.lock().unwrap().push(l)))
            .unwrap();

        assert_eq!(result.exit_code, Some(4));
        let lines = lines.lock().unwrap();
        assert!(lines.contains(&OutputLine::Stdout("running game.py in scripts".to_string())));
        assert!(lines.contains(&OutputLine::Stderr("oops".to_string())));
    }
}
