//! Shared helpers for commands that run install jobs.
//!
//! Jobs post events from worker threads; these helpers receive them on the
//! command's thread and hand them to the UI, so only one thread ever draws.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::jobs::{channel_sink, Batch, BatchReport, EventSink, JobEvent, JobStatus};
use crate::error::PyportError;
use crate::ui::{format_duration, SpinnerHandle, UserInterface};
use crate::workspace::ErrorLog;

use super::dispatcher::{CommandResult, EXIT_FAILURE};

const TICK: Duration = Duration::from_millis(100);

/// Start a batch with a sink feeding this thread, render its events, and
/// wait for it.
pub fn run_batch(
    ui: &mut dyn UserInterface,
    start: impl FnOnce(EventSink) -> Batch,
    deadline: Option<Instant>,
) -> BatchReport {
    let (sink, rx) = channel_sink();
    let batch = start(sink);
    pump_events(ui, &rx, &batch, deadline);
    batch.wait()
}

/// Render events until every sender is gone. When `deadline` passes, the
/// batch is cancelled (repeatedly, until its jobs have all stopped).
pub fn pump_events(
    ui: &mut dyn UserInterface,
    rx: &Receiver<JobEvent>,
    batch: &Batch,
    deadline: Option<Instant>,
) {
    let mut warned = false;
    loop {
        match rx.recv_timeout(TICK) {
            Ok(event) => ui.job_event(&event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if deadline.is_some_and(|d| Instant::now() >= d) && !batch.is_finished() {
            if !warned {
                ui.warning("Install timeout reached, cancelling remaining jobs");
                warned = true;
            }
            batch.cancel_all();
        }
    }
}

/// Finish `spinner` with `what` and the error, log it, and return a
/// failed result.
pub fn fail_spinner(
    spinner: &mut dyn SpinnerHandle,
    log: &ErrorLog,
    what: &str,
    err: &PyportError,
) -> CommandResult {
    let first_line = err.to_string().lines().next().unwrap_or_default().to_string();
    spinner.finish_error(&format!("{}: {}", what, first_line));
    log.record(&format!("{}: {}", what, err));
    CommandResult::failure(EXIT_FAILURE)
}

/// Summarise a batch and log each failure. Returns whether everything
/// succeeded.
pub fn show_batch_report(ui: &mut dyn UserInterface, report: &BatchReport, log: &ErrorLog) -> bool {
    for outcome in report.outcomes.iter().filter(|o| !o.succeeded()) {
        let detail = outcome.error.as_deref().unwrap_or("no output");
        let verb = match outcome.status {
            JobStatus::Skipped => "Skipped",
            JobStatus::Cancelled => "Cancelled",
            _ => "Failed to install",
        };
        log.record(&format!("{} {}: {}", verb, outcome.package, detail));
    }

    let succeeded = report.succeeded().count();
    let total = report.len();
    let elapsed = report
        .outcomes
        .iter()
        .map(|o| o.duration)
        .max()
        .unwrap_or_default();

    if report.all_succeeded() {
        ui.success(&format!(
            "Installed {} of {} packages ({})",
            succeeded,
            total,
            format_duration(elapsed)
        ));
        true
    } else {
        let failed: Vec<&str> = report.failed().map(|o| o.package.as_str()).collect();
        ui.error(&format!(
            "Installed {} of {} packages; failed: {}",
            succeeded,
            total,
            failed.join(", ")
        ));
        false
    }
}
