//! pyport - tools around a portable Python installation.
//!
//! pyport works with a Python interpreter that lives on a removable drive.
//! It finds what a script imports, installs whatever the interpreter is
//! missing (one background job per package), maintains packages through
//! pip, and runs, debugs or packages scripts. It also keeps the drive's
//! workspace chores: autosaves, launchers, backups and an error log.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings file and interpreter selection
//! - [`error`] - Error types and result aliases
//! - [`imports`] - Finding the imports of Python source
//! - [`jobs`] - Concurrent install jobs and their events
//! - [`packages`] - Import-to-distribution names, module probes, pip
//! - [`shell`] - Process execution
//! - [`tools`] - Running, debugging and building scripts
//! - [`ui`] - Prompts, spinners, progress and terminal output
//! - [`workspace`] - Autosave, launchers, backups, search and the error log
//!
//! # Example
//!
//! ```
//! use pyport::imports::extract_imports;
//! use pyport::packages::resolve;
//!
//! let source = "import os\nfrom PIL import Image\nfrom . import sibling\n";
//! let modules: Vec<String> = extract_imports(source).unwrap().into_iter().collect();
//! assert_eq!(modules, vec!["PIL", "os"]);
//! assert_eq!(resolve("PIL"), "Pillow");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod imports;
pub mod jobs;
pub mod packages;
pub mod shell;
pub mod tools;
pub mod ui;
pub mod workspace;

pub use error::{PyportError, Result};
