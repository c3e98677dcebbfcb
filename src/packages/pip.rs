//! The pip front-end.
//!
//! Everything here runs `<interpreter> -m pip ...` synchronously and
//! returns parsed output. Streamed installs live in [`crate::jobs`].

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{PyportError, Result};
use crate::shell::{execute_quiet, ProcessCommand};

/// One row of `pip list --outdated --format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub version: String,
    pub latest_version: String,
}

/// Result of upgrading every outdated package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Upgraded packages with the version now installed.
    pub upgraded: Vec<(String, String)>,
    /// Packages whose upgrade failed.
    pub failed: Vec<String>,
}

impl UpgradeReport {
    pub fn is_empty(&self) -> bool {
        self.upgraded.is_empty() && self.failed.is_empty()
    }
}

/// pip, driven through a specific interpreter.
#[derive(Debug, Clone)]
pub struct Pip {
    interpreter: PathBuf,
}

impl Pip {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// `<interpreter> -m pip <args>`.
    pub fn command<I, S>(&self, args: I) -> ProcessCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        ProcessCommand::new(&self.interpreter)
            .args(["-m", "pip"])
            .args(args)
    }

    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let cmd = self.command(args);
        let result = execute_quiet(&cmd)?.into_checked(&cmd)?;
        if !result.stderr.trim().is_empty() {
            tracing::debug!("{} stderr: {}", cmd.display(), result.stderr.trim());
        }
        Ok(result.stdout)
    }

    /// `pip list`, verbatim.
    pub fn list(&self) -> Result<String> {
        self.run(["list"])
    }

    /// Packages with a newer release available.
    pub fn outdated(&self) -> Result<Vec<OutdatedPackage>> {
        let output = self.run(["list", "--outdated", "--format=json"])?;
        parse_outdated(&output)
    }

    /// Installed version of `name`, from `pip show`.
    pub fn show_version(&self, name: &str) -> Result<Option<String>> {
        let output = self.run(["show", name])?;
        Ok(parse_show_version(&output))
    }

    /// `pip freeze`, verbatim.
    pub fn freeze(&self) -> Result<String> {
        self.run(["freeze"])
    }

    /// Packages nothing else depends on, as a sorted requirements manifest.
    pub fn top_level_requirements(&self) -> Result<String> {
        let output = self.run(["list", "--not-required", "--format=freeze"])?;
        Ok(sort_manifest(&output))
    }

    /// Lowercased names of every installed distribution.
    pub fn installed_names(&self) -> Result<BTreeSet<String>> {
        let output = self.run(["list", "--format=freeze"])?;
        Ok(parse_installed_names(&output))
    }

    /// `pip install --upgrade <name>`.
    pub fn upgrade(&self, name: &str) -> Result<()> {
        self.run(["install", "--upgrade", name]).map(|_| ())
    }

    /// Upgrade pip itself and return its output.
    pub fn update_pip(&self) -> Result<String> {
        self.run(["install", "--upgrade", "pip"])
    }

    /// Make sure a distribution is installed (`pip install <name>`).
    pub fn ensure(&self, name: &str) -> Result<()> {
        self.run(["install", name]).map(|_| ())
    }

    /// Upgrade each outdated package on its own. A failed upgrade is
    /// recorded and the rest continue.
    pub fn upgrade_outdated(&self) -> Result<UpgradeReport> {
        let mut report = UpgradeReport::default();
        for package in self.outdated()? {
            match self.upgrade(&package.name) {
                Ok(()) => {
                    let version = match self.show_version(&package.name) {
                        Ok(Some(v)) => v,
                        Ok(None) | Err(_) => package.latest_version.clone(),
                    };
                    tracing::info!("Upgraded {} to {}", package.name, version);
                    report.upgraded.push((package.name, version));
                }
                Err(e) => {
                    tracing::warn!("Failed to upgrade {}: {}", package.name, e);
                    report.failed.push(package.name);
                }
            }
        }
        Ok(report)
    }

    /// Write the top-level manifest to `path`, creating parent directories.
    /// Nothing is written when no top-level packages are installed.
    pub fn export_requirements(&self, path: &Path) -> Result<String> {
        let manifest = self.top_level_requirements()?;
        if manifest.is_empty() {
            tracing::info!("No top-level packages to export");
            return Ok(manifest);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &manifest)?;
        tracing::info!("Wrote requirements to {}", path.display());
        Ok(manifest)
    }
}

/// Decode `pip list --outdated --format=json`.
pub fn parse_outdated(json: &str) -> Result<Vec<OutdatedPackage>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).map_err(|e| PyportError::PipOutput {
        message: format!("could not decode outdated package list: {}", e),
    })
}

/// The `Version:` field of `pip show` output.
pub fn parse_show_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Sort requirement lines case-insensitively, one per line with a trailing
/// newline. Blank lines are dropped.
pub fn sort_manifest(output: &str) -> String {
    let mut lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines.sort_by_key(|l| l.to_lowercase());

    let mut manifest = lines.join("\n");
    if !manifest.is_empty() {
        manifest.push('\n');
    }
    manifest
}

/// Lowercased names from `name==version` lines.
pub fn parse_installed_names(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| line.split_once("=="))
        .map(|(name, _)| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}
