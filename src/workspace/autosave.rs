//! Saving work in progress.

use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where an autosave went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveOutcome {
    /// The code was blank; nothing written.
    Empty,
    /// The current file was overwritten.
    Overwrote(PathBuf),
    /// A new timestamped file was created.
    Created(PathBuf),
}

/// Autosaves into a fixed directory.
#[derive(Debug, Clone)]
pub struct Autosaver {
    dir: PathBuf,
}

impl Autosaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `code`. With a current file it is overwritten; otherwise a new
    /// `auto_save_script_<timestamp>.pyw` is created.
    pub fn save(&self, code: &str, current: Option<&Path>) -> Result<AutosaveOutcome> {
        self.save_at(code, current, Local::now().naive_local())
    }

    pub fn save_at(
        &self,
        code: &str,
        current: Option<&Path>,
        when: NaiveDateTime,
    ) -> Result<AutosaveOutcome> {
        if code.trim().is_empty() {
            tracing::debug!("Nothing to autosave");
            return Ok(AutosaveOutcome::Empty);
        }

        match current {
            Some(path) => {
                std::fs::write(path, code)?;
                tracing::info!("Autosaved to {}", path.display());
                Ok(AutosaveOutcome::Overwrote(path.to_path_buf()))
            }
            None => {
                std::fs::create_dir_all(&self.dir)?;
                let path = self.dir.join(autosave_file_name(when));
                std::fs::write(&path, code)?;
                tracing::info!("Autosaved to {}", path.display());
                Ok(AutosaveOutcome::Created(path))
            }
        }
    }
}

/// `auto_save_script_YYYYmmdd_HHMMSS.pyw`
pub fn autosave_file_name(when: NaiveDateTime) -> String {
    format!("auto_save_script_{}.pyw", when.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(12, 0, 59)
            .unwrap()
    }

    #[test]
    fn file_name_uses_timestamp() {
        assert_eq!(
            autosave_file_name(noon()),
            "auto_save_script_20241231_120059.pyw"
        );
    }

    #[test]
    fn blank_code_is_not_saved() {
        let temp = TempDir::new().unwrap();
        let saver = Autosaver::new(temp.path().join("AutoSave"));
        let outcome = saver.save_at("  \n\t\n", None, noon()).unwrap();
        assert_eq!(outcome, AutosaveOutcome::Empty);
        assert!(!saver.dir().exists());
    }

    #[test]
    fn without_current_file_creates_timestamped_file() {
        let temp = TempDir::new().unwrap();
        let saver = Autosaver::new(temp.path().join("AutoSave"));
        let outcome = saver.save_at("print('hi')\n", None, noon()).unwrap();

        let expected = temp
            .path()
            .join("AutoSave")
            .join("auto_save_script_20241231_120059.pyw");
        assert_eq!(outcome, AutosaveOutcome::Created(expected.clone()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "print('hi')\n");
    }

    #[test]
    fn current_file_is_overwritten() {
        let temp = TempDir::new().unwrap();
        let current = temp.path().join("game.py");
        std::fs::write(&current, "old").unwrap();

        let saver = Autosaver::new(temp.path().join("AutoSave"));
        let outcome = saver.save_at("new", Some(&current), noon()).unwrap();

        assert_eq!(outcome, AutosaveOutcome::Overwrote(current.clone()));
        assert_eq!(std::fs::read_to_string(current).unwrap(), "new");
        assert!(!saver.dir().exists());
    }
}
