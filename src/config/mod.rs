//! Settings and interpreter selection.
//!
//! Everything pyport remembers lives in one YAML file under the root
//! folder (normally the root of the portable drive):
//!
//! ```yaml
//! python_path: /media/usb/PPython
//! probe: find_spec
//! aliases:
//!   cv2: opencv-python-headless
//! ```
//!
//! # Example
//!
//! ```
//! use pyport::config::Settings;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let mut settings = Settings::load(temp.path()).unwrap();
//! settings.python_path = Some("/media/usb/PPython".into());
//! settings.save(temp.path()).unwrap();
//!
//! let loaded = Settings::load(temp.path()).unwrap();
//! assert_eq!(loaded.python_path, settings.python_path);
//! ```

pub mod interpreter;
pub mod settings;

pub use interpreter::{resolve_executable, select, Interpreter, InterpreterSource};
pub use settings::{Settings, CONFIG_DIR, SETTINGS_FILE};
