//! Platform-specific details: CI detection and interpreter layout.

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()`.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Relative paths, in lookup order, where an installation folder keeps its
/// Python executable.
pub fn python_executable_candidates() -> &'static [&'static str] {
    if cfg!(windows) {
        &["python.exe", "Scripts/python.exe"]
    } else {
        &["bin/python3", "bin/python", "python3", "python"]
    }
}

/// Whether a directory entry is hidden or a system file.
///
/// Dot-names count as hidden everywhere. On Windows the hidden (0x2) and
/// system (0x4) attributes count as well.
pub fn is_hidden_or_system(path: &std::path::Path) -> bool {
    let dot_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    dot_name || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &std::path::Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const HIDDEN: u32 = 0x2;
    const SYSTEM: u32 = 0x4;
    std::fs::symlink_metadata(path)
        .map(|m| m.file_attributes() & (HIDDEN | SYSTEM) != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &std::path::Path) -> bool {
    false
}
