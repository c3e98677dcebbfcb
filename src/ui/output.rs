//! Output verbosity.
//!
//! Results (import names, package lists, warnings and errors) are printed
//! in every mode, so `pyport --quiet imports game.py | sort` only ever sees
//! them. The modes differ in what surrounds those results.

/// How much pyport prints around a command's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Also stream every install job's output as `[package] line`, plus
    /// the per-command detail lines.
    Verbose,
    /// Headers, spinners and the live install board.
    #[default]
    Normal,
    /// Results only.
    Quiet,
}

impl OutputMode {
    /// Whether pip's own output and other detail lines are shown.
    pub fn shows_job_output(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Whether headers, animated spinners and per-job progress are shown.
    pub fn shows_progress(&self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verbose_streams_job_output() {
        assert!(OutputMode::Verbose.shows_job_output());
        assert!(!OutputMode::Normal.shows_job_output());
        assert!(!OutputMode::Quiet.shows_job_output());
    }

    #[test]
    fn quiet_drops_progress_for_piping() {
        assert!(OutputMode::Verbose.shows_progress());
        assert!(OutputMode::Normal.shows_progress());
        assert!(!OutputMode::Quiet.shows_progress());
    }

    #[test]
    fn normal_is_the_default() {
        assert_eq!(OutputMode::default(), OutputMode::Normal);
    }
}
