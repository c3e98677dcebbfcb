//! Live display of concurrent install jobs.
//!
//! Each job gets its own line in an indicatif `MultiProgress`. Progress
//! events update the job's line; the completion event freezes it with the
//! final status.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

use crate::jobs::{JobEvent, JobEventKind, JobId, JobOutcome, JobStatus};

use super::spinner::{finished_style, spinner_style, truncate_line};
use super::PyportTheme;

/// One line per running job.
pub struct InstallBoard {
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
    errors: HashMap<JobId, String>,
    theme: PyportTheme,
}

impl InstallBoard {
    /// A board drawing to stderr.
    pub fn new(theme: PyportTheme) -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), theme)
    }

    /// A board that tracks state without drawing.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden(), PyportTheme::plain())
    }

    fn with_target(target: ProgressDrawTarget, theme: PyportTheme) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: HashMap::new(),
            errors: HashMap::new(),
            theme,
        }
    }

    fn bar(&mut self, job: JobId, package: &str) -> &ProgressBar {
        let multi = &self.multi;
        self.bars.entry(job).or_insert_with(|| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(spinner_style(2));
            bar.set_message(format!("Installing {}", package));
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        })
    }

    /// Jobs that have a line but have not completed.
    pub fn running(&self) -> usize {
        self.bars.values().filter(|b| !b.is_finished()).count()
    }

    /// Current text of a job's line.
    pub fn line(&self, job: JobId) -> Option<String> {
        self.bars.get(&job).map(|b| b.message())
    }

    /// Print a line above the board without tearing it.
    pub fn println(&self, line: &str) {
        if self.multi.println(line).is_err() {
            eprintln!("{}", line);
        }
    }

    /// Update the board for one event.
    pub fn apply(&mut self, event: &JobEvent) {
        match &event.kind {
            JobEventKind::Progress(line) => {
                let text = format!("{} » {}", event.package, truncate_line(line.trim_end()));
                self.bar(event.job, &event.package).set_message(text);
            }
            JobEventKind::Error(stderr) | JobEventKind::Skipped(stderr) => {
                let last = stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                self.errors.insert(event.job, last);
            }
            JobEventKind::Completed(outcome) => {
                let reason = self.errors.remove(&event.job);
                let line = completion_line(&self.theme, outcome, reason.as_deref());
                let bar = self.bar(event.job, &event.package).clone();
                bar.set_style(finished_style());
                bar.finish_with_message(format!("  {}", line));
            }
        }
    }
}

/// The frozen line for a finished job.
pub fn completion_line(theme: &PyportTheme, outcome: &JobOutcome, reason: Option<&str>) -> String {
    let duration = format_duration(outcome.duration);
    let with_reason = |verb: &str| match reason.filter(|r| !r.is_empty()) {
        Some(r) => format!("{} {}: {}", outcome.package, verb, truncate_line(r)),
        None => format!("{} {}", outcome.package, verb),
    };
    match outcome.status {
        JobStatus::Succeeded => {
            theme.format_success(&format!("{} installed ({})", outcome.package, duration))
        }
        JobStatus::Failed => theme.format_error(&with_reason("failed")),
        JobStatus::Skipped => theme.format_skipped(&with_reason("skipped")),
        JobStatus::Cancelled => theme.format_warning(&format!("{} cancelled", outcome.package)),
    }
}

/// Format duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}
