//! One-click launchers for saved scripts.
//!
//! A launcher sits next to the script and runs it with the portable
//! interpreter, located relative to the drive the launcher lives on. On
//! Windows that is a Windows Script Host file; elsewhere a shell script.

use std::path::{Path, PathBuf};

use crate::error::{PyportError, Result};

/// Which launcher flavor to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    /// `.vbs`, run by Windows Script Host.
    ScriptHost,
    /// `.sh`.
    Shell,
}

impl LauncherKind {
    /// The flavor native to this platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            LauncherKind::ScriptHost
        } else {
            LauncherKind::Shell
        }
    }

    fn extension(self) -> &'static str {
        match self {
            LauncherKind::ScriptHost => "vbs",
            LauncherKind::Shell => "sh",
        }
    }
}

/// Launcher settings.
#[derive(Debug, Clone)]
pub struct Launcher {
    kind: LauncherKind,
    portable_dir: String,
    scripts_dir: String,
}

impl Launcher {
    pub fn new(kind: LauncherKind, portable_dir: impl Into<String>) -> Self {
        Self {
            kind,
            portable_dir: portable_dir.into(),
            scripts_dir: "Saved Scripts".to_string(),
        }
    }

    /// Drive folder scripts are saved in.
    pub fn with_scripts_dir(mut self, scripts_dir: impl Into<String>) -> Self {
        self.scripts_dir = scripts_dir.into();
        self
    }

    /// `Open Project - <stem>.<ext>` next to `script`.
    pub fn launcher_path(&self, script: &Path) -> Result<PathBuf> {
        let stem = script
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PyportError::Other(anyhow::anyhow!(
                "cannot name a launcher for {}",
                script.display()
            )))?;
        let name = format!("Open Project - {}.{}", stem, self.kind.extension());
        Ok(script.with_file_name(name))
    }

    /// Launcher file contents for `script`.
    pub fn render(&self, script: &Path) -> Result<String> {
        let script_name = script
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PyportError::Other(anyhow::anyhow!(
                "script path has no file name: {}",
                script.display()
            )))?;

        Ok(match self.kind {
            LauncherKind::ScriptHost => format!(
                "Set objShell = CreateObject(\"WScript.Shell\")\r\n\
                 drive = Left(WScript.ScriptFullName, 2)\r\n\
                 objShell.Run \"\"\"\" & drive & \"\\{portable}\\pythonw.exe\"\" \"\"\" & drive & \"\\{scripts}\\{script}\"\"\"\r\n",
                portable = self.portable_dir,
                scripts = self.scripts_dir,
                script = script_name,
            ),
            LauncherKind::Shell => format!(
                "#!/bin/sh\n\
                 here=\"$(cd \"$(dirname \"$0\")\" && pwd)\"\n\
                 drive=\"$(cd \"$here/..\" && pwd)\"\n\
                 exec \"$drive/{portable}/bin/python3\" \"$drive/{scripts}/{script}\" \"$@\"\n",
                portable = self.portable_dir,
                scripts = self.scripts_dir,
                script = script_name,
            ),
        })
    }

    /// Write the launcher for `script` and return its path.
    pub fn write(&self, script: &Path) -> Result<PathBuf> {
        let path = self.launcher_path(script)?;
        std::fs::write(&path, self.render(script)?)?;

        if self.kind == LauncherKind::Shell {
            make_executable(&path)?;
        }

        tracing::info!("Created launcher {}", path.display());
        Ok(path)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
