//! Files on the drive: backups, launchers, autosaves, search and the
//! error log.

pub mod autosave;
pub mod backup;
pub mod errorlog;
pub mod launcher;
pub mod search;

pub use autosave::{AutosaveOutcome, Autosaver};
pub use backup::{Backup, BackupReport};
pub use errorlog::ErrorLog;
pub use launcher::{Launcher, LauncherKind};
pub use search::{Match, Searcher, TextSearch};
