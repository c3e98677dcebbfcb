//! Runs one external process as a job on its own worker thread.
//!
//! Standard output is streamed line by line as progress. Standard error is
//! collected and becomes the error payload if the process fails. Every job
//! posts exactly one completion event, after its process has exited and all
//! of its output was delivered. A cancelled job stops waiting for output
//! shortly after its process is killed.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::event::{EventSink, JobEvent, JobEventKind, JobId, JobOutcome, JobStatus};
use super::registry::{ActiveJob, JobRegistry};
use crate::shell::{CommandOptions, ProcessCommand};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long a cancelled job waits for its output pipes to close. A
/// process left behind by the killed one can hold them open indefinitely.
const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// What a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Name the job reports under; the distribution name for installs.
    pub label: String,
    pub command: ProcessCommand,
    pub cwd: Option<PathBuf>,
}

impl JobSpec {
    pub fn new(label: impl Into<String>, command: ProcessCommand) -> Self {
        Self {
            label: label.into(),
            command,
            cwd: None,
        }
    }

    /// `<interpreter> -m pip install <dist>`.
    pub fn pip_install(interpreter: &Path, dist: &str) -> Self {
        let command = ProcessCommand::new(interpreter).args(["-m", "pip", "install", dist]);
        Self::new(dist, command)
    }

    /// `<interpreter> -m pip install -r <file>`.
    pub fn pip_install_requirements(interpreter: &Path, file: &Path) -> Self {
        let label = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "requirements".to_string());
        let command = ProcessCommand::new(interpreter)
            .args(["-m", "pip", "install", "-r"])
            .arg(OsString::from(file));
        Self::new(label, command)
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// A running job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    package: String,
    thread: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job and return the outcome its completion event carried.
    pub fn join(self) -> JobOutcome {
        let package = self.package;
        self.thread.join().unwrap_or_else(|_| JobOutcome {
            package,
            status: JobStatus::Failed,
            exit_code: None,
            error: Some("job thread panicked".to_string()),
            duration: Duration::ZERO,
        })
    }
}

/// Starts jobs.
pub struct InstallJob;

impl InstallJob {
    /// Start `spec` on a new worker thread.
    pub fn spawn(spec: JobSpec, registry: &Arc<JobRegistry>, sink: EventSink) -> JobHandle {
        let id = registry.next_id();
        let package = spec.label.clone();
        let registry = Arc::clone(registry);
        tracing::debug!("Starting job {} for {}", id, package);
        let thread = thread::spawn(move || run_job(id, spec, &registry, sink));
        JobHandle {
            id,
            package,
            thread,
        }
    }
}

fn run_job(id: JobId, spec: JobSpec, registry: &JobRegistry, sink: EventSink) -> JobOutcome {
    let start = Instant::now();
    let emit = |kind: JobEventKind| {
        sink(JobEvent {
            job: id,
            package: spec.label.clone(),
            kind,
        })
    };

    let options = CommandOptions {
        cwd: spec.cwd.clone(),
        ..Default::default()
    };
    let mut cmd = spec.command.to_command(&options);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let reason = format!("could not start {}: {}", spec.command.display(), e);
            tracing::warn!("Skipping {}: {}", spec.label, reason);
            emit(JobEventKind::Skipped(reason.clone()));
            let outcome = JobOutcome {
                package: spec.label.clone(),
                status: JobStatus::Skipped,
                exit_code: None,
                error: Some(reason),
                duration: start.elapsed(),
            };
            emit(JobEventKind::Completed(outcome.clone()));
            return outcome;
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let child = Arc::new(Mutex::new(child));
    let cancelled = Arc::new(AtomicBool::new(false));
    registry.register(
        id,
        ActiveJob {
            child: Arc::clone(&child),
            cancelled: Arc::clone(&cancelled),
            package: spec.label.clone(),
        },
    );

    // The reader forwards through this slot; emptying it detaches the
    // reader from the sink so receivers see the channel close.
    let progress: Arc<Mutex<Option<EventSink>>> = Arc::new(Mutex::new(Some(Arc::clone(&sink))));
    let stdout_reader = stdout.map(|out| {
        let progress = Arc::clone(&progress);
        let package = spec.label.clone();
        thread::spawn(move || {
            for line in BufReader::new(out).lines().map_while(std::result::Result::ok) {
                let guard = progress.lock().unwrap_or_else(PoisonError::into_inner);
                let Some(sink) = guard.as_ref() else { break };
                sink(JobEvent {
                    job: id,
                    package: package.clone(),
                    kind: JobEventKind::Progress(line),
                });
            }
        })
    });
    let stderr_reader = stderr.map(|err| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = BufReader::new(err).read_to_string(&mut text);
            text
        })
    });

    let status = wait_for_exit(&child);

    let grace = cancelled.load(Ordering::SeqCst).then_some(CANCEL_GRACE);
    if let Some(reader) = stdout_reader {
        if join_within(reader, grace).is_none() {
            tracing::debug!("Abandoning output of cancelled job {} ({})", id, spec.label);
        }
    }
    progress.lock().unwrap_or_else(PoisonError::into_inner).take();
    let stderr_text = stderr_reader
        .and_then(|r| join_within(r, grace))
        .unwrap_or_default();
    registry.unregister(id);

    let stderr_text = stderr_text.trim().to_string();
    let duration = start.elapsed();
    let outcome = if cancelled.load(Ordering::SeqCst) {
        JobOutcome {
            package: spec.label.clone(),
            status: JobStatus::Cancelled,
            exit_code: status.as_ref().ok().and_then(ExitStatus::code),
            error: Some("cancelled".to_string()),
            duration,
        }
    } else {
        match status {
            Ok(status) if status.success() => {
                if !stderr_text.is_empty() {
                    tracing::debug!("{} stderr: {}", spec.label, stderr_text);
                }
                JobOutcome {
                    package: spec.label.clone(),
                    status: JobStatus::Succeeded,
                    exit_code: status.code(),
                    error: None,
                    duration,
                }
            }
            Ok(status) => {
                let payload = if stderr_text.is_empty() {
                    match status.code() {
                        Some(code) => format!("exited with status {}", code),
                        None => "terminated by signal".to_string(),
                    }
                } else {
                    stderr_text
                };
                emit(JobEventKind::Error(payload.clone()));
                JobOutcome {
                    package: spec.label.clone(),
                    status: JobStatus::Failed,
                    exit_code: status.code(),
                    error: Some(payload),
                    duration,
                }
            }
            Err(e) => {
                let payload = format!("failed waiting for process: {}", e);
                emit(JobEventKind::Error(payload.clone()));
                JobOutcome {
                    package: spec.label.clone(),
                    status: JobStatus::Failed,
                    exit_code: None,
                    error: Some(payload),
                    duration,
                }
            }
        }
    };

    tracing::debug!("Job {} ({}) finished: {:?}", id, spec.label, outcome.status);
    emit(JobEventKind::Completed(outcome.clone()));
    outcome
}

/// Join `handle`, giving up after `grace` when one is given. A reader
/// given up on is left to finish on its own.
fn join_within<T>(handle: JoinHandle<T>, grace: Option<Duration>) -> Option<T> {
    if let Some(grace) = grace {
        let deadline = Instant::now() + grace;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
    handle.join().ok()
}

/// Poll instead of blocking in `wait` so the registry can take the lock
/// and kill the process.
fn wait_for_exit(child: &Mutex<std::process::Child>) -> std::io::Result<ExitStatus> {
    loop {
        let polled = child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_wait();
        match polled {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(e),
        }
    }
}
