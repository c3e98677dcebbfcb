//! Copying a drive's contents somewhere else.
//!
//! Every top-level entry of the source is copied into the destination,
//! merging into directories that already exist. The portable interpreter
//! folder and hidden or system entries are left out. Filtering applies to
//! top-level entries only; everything inside a copied folder is copied.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PyportError, Result};
use crate::shell::is_hidden_or_system;

/// What happened to each top-level entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    /// Entries that failed, with the reason. Other entries still copy.
    pub failed: Vec<(PathBuf, String)>,
}

impl BackupReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A backup from one folder into another.
#[derive(Debug, Clone)]
pub struct Backup {
    source: PathBuf,
    destination: PathBuf,
    skip_folder: String,
}

impl Backup {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        skip_folder: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            skip_folder: skip_folder.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Whether a top-level entry is left out of the backup.
    pub fn is_skipped(&self, entry: &Path) -> bool {
        let skip_named = entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(&self.skip_folder));
        skip_named || is_hidden_or_system(entry) || self.contains_destination(entry)
    }

    // Copying a folder that holds the destination would recurse forever.
    fn contains_destination(&self, entry: &Path) -> bool {
        match (entry.canonicalize(), self.destination.canonicalize()) {
            (Ok(entry), Ok(dest)) => dest.starts_with(entry),
            _ => false,
        }
    }

    /// Copy everything. Only failing to read the source or create the
    /// destination is an error; per-entry failures land in the report.
    pub fn run(&self) -> Result<BackupReport> {
        if !self.source.is_dir() {
            return Err(PyportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("backup source {} is not a folder", self.source.display()),
            )));
        }
        fs::create_dir_all(&self.destination)?;

        let mut entries: Vec<PathBuf> = fs::read_dir(&self.source)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        let mut report = BackupReport::default();
        for entry in entries {
            if self.is_skipped(&entry) {
                tracing::debug!("Skipping {}", entry.display());
                report.skipped.push(entry);
                continue;
            }

            let Some(name) = entry.file_name() else {
                continue;
            };
            let target = self.destination.join(name);
            match copy_recursive(&entry, &target) {
                Ok(()) => {
                    tracing::debug!("Copied {}", entry.display());
                    report.copied.push(entry);
                }
                Err(e) => {
                    tracing::warn!("Failed to copy {}: {}", entry.display(), e);
                    report.failed.push((entry, e.to_string()));
                }
            }
        }

        tracing::info!(
            "Backup to {}: {} copied, {} skipped, {} failed",
            self.destination.display(),
            report.copied.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

fn copy_recursive(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        fs::create_dir_all(target)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &target.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, target).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn drive() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("PPython").join("Lib")).unwrap();
        fs::write(root.join("PPython").join("python.exe"), "").unwrap();
        fs::create_dir_all(root.join("Saved Scripts").join("nested")).unwrap();
        fs::write(root.join("Saved Scripts").join("game.py"), "print(1)").unwrap();
        fs::write(root.join("Saved Scripts").join("nested").join(".keep"), "").unwrap();
        fs::write(root.join("notes.txt"), "hello").unwrap();
        fs::create_dir_all(root.join(".Trash")).unwrap();
        temp
    }

    #[test]
    fn copies_everything_but_interpreter_and_hidden() {
        let source = drive();
        let dest = TempDir::new().unwrap();

        let report = Backup::new(source.path(), dest.path(), "PPython")
            .run()
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(
            fs::read_to_string(dest.path().join("Saved Scripts").join("game.py")).unwrap(),
            "print(1)"
        );
        assert!(dest.path().join("notes.txt").exists());
        assert!(!dest.path().join("PPython").exists());
        assert!(!dest.path().join(".Trash").exists());
    }

    #[test]
    fn hidden_filter_is_top_level_only() {
        let source = drive();
        let dest = TempDir::new().unwrap();
        Backup::new(source.path(), dest.path(), "PPython")
            .run()
            .unwrap();
        assert!(dest
            .path()
            .join("Saved Scripts")
            .join("nested")
            .join(".keep")
            .exists());
    }

    #[test]
    fn skip_folder_matches_case_insensitively() {
        let backup = Backup::new("/drive", "/backup", "PPython");
        assert!(backup.is_skipped(Path::new("/drive/ppython")));
        assert!(backup.is_skipped(Path::new("/drive/PPYTHON")));
        assert!(!backup.is_skipped(Path::new("/drive/PPython2")));
    }

    #[test]
    fn merges_into_existing_destination() {
        let source = drive();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(dest.path().join("Saved Scripts")).unwrap();
        fs::write(dest.path().join("Saved Scripts").join("old.py"), "").unwrap();
        fs::write(dest.path().join("Saved Scripts").join("game.py"), "stale").unwrap();

        Backup::new(source.path(), dest.path(), "PPython")
            .run()
            .unwrap();

        let scripts = dest.path().join("Saved Scripts");
        assert!(scripts.join("old.py").exists());
        assert_eq!(fs::read_to_string(scripts.join("game.py")).unwrap(), "print(1)");
    }

    #[test]
    fn destination_inside_source_is_not_copied_into_itself() {
        let source = drive();
        let dest = source.path().join("Backups").join("today");
        fs::create_dir_all(&dest).unwrap();

        let report = Backup::new(source.path(), &dest, "PPython").run().unwrap();

        assert!(report.skipped.contains(&source.path().join("Backups")));
        assert!(dest.join("notes.txt").exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dest = TempDir::new().unwrap();
        let result = Backup::new("/definitely/not/here", dest.path(), "PPython").run();
        assert!(result.is_err());
    }
}
