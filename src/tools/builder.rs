//! Packaging a script as a standalone executable with PyInstaller.
//!
//! Layout of a build named `app` under `<output>`:
//!
//! ```text
//! <output>/app/app.pyw     copy of the script (removed afterwards)
//! <output>/app/build/      PyInstaller work dir (removed afterwards)
//! <output>/app/spec/       generated spec (removed afterwards)
//! <output>/app/app[.exe]   the executable
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PyportError, Result};
use crate::packages::Pip;
use crate::shell::{execute_streaming, CommandOptions, OutputCallback, ProcessCommand};

/// Paths of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub app_dir: PathBuf,
    pub script_copy: PathBuf,
    pub work_dir: PathBuf,
    pub spec_dir: PathBuf,
}

impl BuildLayout {
    pub fn new(output_root: &Path, name: &str) -> Self {
        let app_dir = output_root.join(name);
        Self {
            script_copy: app_dir.join(format!("{}.pyw", name)),
            work_dir: app_dir.join("build"),
            spec_dir: app_dir.join("spec"),
            app_dir,
        }
    }

    /// Where PyInstaller puts the executable.
    pub fn executable(&self, name: &str) -> PathBuf {
        if cfg!(windows) {
            self.app_dir.join(format!("{}.exe", name))
        } else {
            self.app_dir.join(name)
        }
    }
}

/// Builds standalone executables.
#[derive(Debug, Clone)]
pub struct Builder {
    interpreter: PathBuf,
}

impl Builder {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// The PyInstaller invocation for `layout`.
    pub fn pyinstaller_command(&self, layout: &BuildLayout) -> ProcessCommand {
        ProcessCommand::new(&self.interpreter)
            .args(["-m", "PyInstaller", "--distpath"])
            .arg(layout.app_dir.as_os_str())
            .arg("--workpath")
            .arg(layout.work_dir.as_os_str())
            .arg("--specpath")
            .arg(layout.spec_dir.as_os_str())
            .args(["--onefile", "--noconsole"])
            .arg(layout.script_copy.as_os_str())
    }

    /// Build `script` as `name` under `output_root`. PyInstaller's output
    /// goes to `callback`. Returns the executable's path.
    pub fn build(
        &self,
        script: &Path,
        name: &str,
        output_root: &Path,
        callback: OutputCallback,
    ) -> Result<PathBuf> {
        validate_name(name)?;
        let layout = BuildLayout::new(output_root, name);

        fs::create_dir_all(&layout.app_dir)?;
        fs::copy(script, &layout.script_copy)?;

        tracing::info!("Ensuring PyInstaller is installed");
        Pip::new(&self.interpreter).ensure("pyinstaller")?;

        let cmd = self.pyinstaller_command(&layout);
        let result = execute_streaming(&cmd, &CommandOptions::default(), callback)?
            .into_checked(&cmd)?;
        tracing::debug!("PyInstaller finished in {:.1?}", result.duration);

        cleanup(&layout);
        let executable = layout.executable(name);
        tracing::info!("Built {}", executable.display());
        Ok(executable)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.trim().is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != "..";
    if valid {
        Ok(())
    } else {
        Err(PyportError::Other(anyhow::anyhow!(
            "'{}' is not a usable build name",
            name
        )))
    }
}

fn cleanup(layout: &BuildLayout) {
    for dir in [&layout.work_dir, &layout.spec_dir] {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::debug!("Could not remove {}: {}", dir.display(), e);
        }
    }
    if let Err(e) = fs::remove_file(&layout.script_copy) {
        tracing::debug!("Could not remove {}: {}", layout.script_copy.display(), e);
    }
}
