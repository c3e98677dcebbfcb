//! Events posted by install jobs.

use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Identifies one job for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Failed,
    Skipped,
    Cancelled,
}

impl JobStatus {
    pub fn is_success(self) -> bool {
        self == JobStatus::Succeeded
    }
}

/// Final result of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// The label the job was started with (a distribution name for installs).
    pub package: String,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    /// Error payload for failed or skipped jobs.
    pub error: Option<String>,
    pub duration: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEventKind {
    /// One line of standard output.
    Progress(String),
    /// The process exited non-zero; carries its stderr.
    Error(String),
    /// The process could not be started.
    Skipped(String),
    /// The job is over. Posted exactly once, last.
    Completed(JobOutcome),
}

/// An event tagged with the job and package it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub job: JobId,
    pub package: String,
    pub kind: JobEventKind,
}

impl JobEvent {
    pub fn is_completion(&self) -> bool {
        matches!(self.kind, JobEventKind::Completed(_))
    }
}

/// Where workers post events. Called from worker threads.
pub type EventSink = Arc<dyn Fn(JobEvent) + Send + Sync>;

/// A sink that drops every event.
pub fn null_sink() -> EventSink {
    Arc::new(|_| {})
}

/// A sink feeding a channel, so one thread (the UI) can render events
/// posted by many workers.
pub fn channel_sink() -> (EventSink, mpsc::Receiver<JobEvent>) {
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    let sink: EventSink = Arc::new(move |event| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(event);
        }
    });
    (sink, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(package: &str) -> JobEvent {
        JobEvent {
            job: JobId(1),
            package: package.to_string(),
            kind: JobEventKind::Completed(JobOutcome {
                package: package.to_string(),
                status: JobStatus::Succeeded,
                exit_code: Some(0),
                error: None,
                duration: Duration::ZERO,
            }),
        }
    }

    #[test]
    fn channel_sink_delivers_across_threads() {
        let (sink, rx) = channel_sink();
        let worker_sink = Arc::clone(&sink);
        std::thread::spawn(move || worker_sink(completed("requests")))
            .join()
            .unwrap();
        drop(sink);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_completion());
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = channel_sink();
        drop(rx);
        sink(completed("x"));
    }

    #[test]
    fn job_id_displays_with_hash() {
        assert_eq!(JobId(7).to_string(), "#7");
    }

    #[test]
    fn only_succeeded_is_success() {
        assert!(JobStatus::Succeeded.is_success());
        assert!(!JobStatus::Failed.is_success());
        assert!(!JobStatus::Skipped.is_success());
        assert!(!JobStatus::Cancelled.is_success());
    }
}
