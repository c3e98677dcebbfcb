//! The settings file, `<root>/config/pyport.yml`.
//!
//! Every field is optional; a missing file means defaults. Saving writes a
//! temp file and renames it over the old one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{PyportError, Result};
use crate::packages::{PackageAliases, ProbeMode};

/// Directory under the root that holds configuration.
pub const CONFIG_DIR: &str = "config";

/// File name of the settings file.
pub const SETTINGS_FILE: &str = "pyport.yml";

/// Single-field JSON file older installs kept the interpreter path in.
pub const LEGACY_FILE: &str = "python_path.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interpreter folder or executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_path: Option<PathBuf>,

    /// How installed modules are detected.
    pub probe: ProbeMode,

    /// Extra import-name to distribution-name mappings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,

    /// Error log, relative to the root.
    pub error_log: PathBuf,

    /// Folder holding the portable interpreter. Skipped by backups; the
    /// requirements manifest is exported into it.
    pub portable_dir: String,

    /// Where unsaved code is autosaved, relative to the root.
    pub autosave_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python_path: None,
            probe: ProbeMode::default(),
            aliases: BTreeMap::new(),
            error_log: PathBuf::from("error_log.txt"),
            portable_dir: "PPython".to_string(),
            autosave_dir: PathBuf::from("AutoSave"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacySettings {
    python_path: Option<PathBuf>,
}

impl Settings {
    /// Path of the settings file under `root`.
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(SETTINGS_FILE)
    }

    /// Load settings from `root`, falling back to the legacy JSON file for
    /// the interpreter path, then to defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);

        if !path.exists() {
            let legacy = root.join(CONFIG_DIR).join(LEGACY_FILE);
            if legacy.exists() {
                return Self::load_legacy(&legacy);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::parse(&content, &path)
    }

    /// Parse settings text; `path` is used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self =
            serde_yaml::from_str(content).map_err(|e| PyportError::ConfigParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn load_legacy(path: &Path) -> Result<Self> {
        tracing::debug!("Reading interpreter path from {}", path.display());
        let content = fs::read_to_string(path)?;
        let legacy: LegacySettings =
            serde_json::from_str(&content).map_err(|e| PyportError::ConfigParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            python_path: legacy.python_path,
            ..Self::default()
        })
    }

    /// Save settings under `root` using an atomic write.
    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir)?;

        let path = Self::file_path(root);
        let content =
            serde_yaml::to_string(self).map_err(|e| PyportError::ConfigValidationError {
                message: format!("Failed to serialize settings: {}", e),
            })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Check values that serde accepts but pyport cannot use.
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.portable_dir).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name {
            return Err(PyportError::ConfigValidationError {
                message: format!(
                    "portable_dir must be a single folder name, got '{}'",
                    self.portable_dir
                ),
            });
        }

        for (import, dist) in &self.aliases {
            if import.trim().is_empty() || dist.trim().is_empty() {
                return Err(PyportError::ConfigValidationError {
                    message: format!("alias '{}: {}' has an empty side", import, dist),
                });
            }
        }

        if self.python_path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(PyportError::ConfigValidationError {
                message: "python_path is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Import-name aliases with the user's entries applied.
    pub fn package_aliases(&self) -> PackageAliases {
        PackageAliases::with_overrides(self.aliases.clone())
    }

    pub fn error_log_path(&self, root: &Path) -> PathBuf {
        root.join(&self.error_log)
    }

    pub fn autosave_path(&self, root: &Path) -> PathBuf {
        root.join(&self.autosave_dir)
    }

    pub fn portable_path(&self, root: &Path) -> PathBuf {
        root.join(&self.portable_dir)
    }

    /// Where `export` writes the requirements manifest.
    pub fn requirements_path(&self, root: &Path) -> PathBuf {
        self.portable_path(root).join("requirements.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.portable_dir, "PPython");
        assert_eq!(settings.probe, ProbeMode::FindSpec);
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut settings = Settings {
            python_path: Some(PathBuf::from("/media/usb/PPython")),
            probe: ProbeMode::Import,
            ..Settings::default()
        };
        settings
            .aliases
            .insert("cv2".to_string(), "opencv-python-headless".to_string());

        settings.save(temp.path()).unwrap();
        let loaded = Settings::load(temp.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        Settings::default().save(temp.path()).unwrap();

        let path = Settings::file_path(temp.path());
        assert!(path.exists());
        assert!(!path.with_extension("yml.tmp").exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings = Settings::parse("probe: import\n", Path::new("pyport.yml")).unwrap();
        assert_eq!(settings.probe, ProbeMode::Import);
        assert_eq!(settings.autosave_dir, PathBuf::from("AutoSave"));
        assert!(settings.python_path.is_none());
    }

    #[test]
    fn empty_file_is_defaults() {
        let settings = Settings::parse("\n", Path::new("pyport.yml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = Settings::parse("probe: [unclosed\n", Path::new("pyport.yml")).unwrap_err();
        assert!(matches!(err, PyportError::ConfigParseError { .. }));
    }

    #[test]
    fn unknown_probe_mode_is_parse_error() {
        let err = Settings::parse("probe: guess\n", Path::new("pyport.yml")).unwrap_err();
        assert!(matches!(err, PyportError::ConfigParseError { .. }));
    }

    #[test]
    fn nested_portable_dir_is_rejected() {
        let err =
            Settings::parse("portable_dir: a/b\n", Path::new("pyport.yml")).unwrap_err();
        assert!(matches!(err, PyportError::ConfigValidationError { .. }));
    }

    #[test]
    fn legacy_json_supplies_interpreter() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&config).unwrap();
        fs::write(
            config.join(LEGACY_FILE),
            r#"{"python_path": "/media/usb/PPython"}"#,
        )
        .unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(
            settings.python_path,
            Some(PathBuf::from("/media/usb/PPython"))
        );
    }

    #[test]
    fn yaml_file_wins_over_legacy_json() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join(LEGACY_FILE), r#"{"python_path": "/old"}"#).unwrap();
        fs::write(config.join(SETTINGS_FILE), "python_path: /new\n").unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings.python_path, Some(PathBuf::from("/new")));
    }

    #[test]
    fn paths_resolve_against_root() {
        let settings = Settings::default();
        let root = Path::new("/drive");
        assert_eq!(
            settings.requirements_path(root),
            PathBuf::from("/drive/PPython/requirements.txt")
        );
        assert_eq!(
            settings.error_log_path(root),
            PathBuf::from("/drive/error_log.txt")
        );
    }

    #[test]
    fn user_aliases_override_builtins() {
        let mut settings = Settings::default();
        settings
            .aliases
            .insert("PIL".to_string(), "pillow-simd".to_string());
        assert_eq!(settings.package_aliases().resolve("PIL"), "pillow-simd");
        assert_eq!(settings.package_aliases().resolve("yaml"), "PyYAML");
    }
}
