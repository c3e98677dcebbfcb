//! Tracks running jobs so they can be cancelled.

use std::collections::HashMap;
use std::process::Child;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::event::JobId;

/// Shared handle to a running process and its cancellation flag.
#[derive(Debug, Clone)]
pub(crate) struct ActiveJob {
    pub(crate) child: Arc<Mutex<Child>>,
    pub(crate) cancelled: Arc<AtomicBool>,
    pub(crate) package: String,
}

/// Registry of active jobs.
///
/// Jobs register when their process starts and unregister once it has
/// exited. Cancelling kills the process; the job then completes as
/// cancelled.
#[derive(Debug, Default)]
pub struct JobRegistry {
    next_id: AtomicU64,
    active: Mutex<HashMap<JobId, ActiveJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id.
    pub fn next_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn register(&self, id: JobId, job: ActiveJob) {
        if let Ok(mut active) = self.active.lock() {
            active.insert(id, job);
        }
    }

    pub(crate) fn unregister(&self, id: JobId) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&id);
        }
    }

    /// Cancel one job. Returns false if its process is not running.
    pub fn cancel(&self, id: JobId) -> bool {
        let job = match self.active.lock() {
            Ok(active) => active.get(&id).cloned(),
            Err(_) => None,
        };
        job.is_some_and(|job| kill(id, &job))
    }

    /// Cancel every running job. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let jobs: Vec<(JobId, ActiveJob)> = match self.active.lock() {
            Ok(active) => active.iter().map(|(id, j)| (*id, j.clone())).collect(),
            Err(_) => Vec::new(),
        };
        jobs.iter().filter(|(id, job)| kill(*id, job)).count()
    }

    /// Ids and packages of running jobs, ordered by id.
    pub fn active(&self) -> Vec<(JobId, String)> {
        let mut jobs: Vec<(JobId, String)> = match self.active.lock() {
            Ok(active) => active
                .iter()
                .map(|(id, j)| (*id, j.package.clone()))
                .collect(),
            Err(_) => Vec::new(),
        };
        jobs.sort();
        jobs
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().map(|a| a.is_empty()).unwrap_or(true)
    }
}

/// Kill the job's process unless it already exited. The flag is set under
/// the child lock, so a job whose process finished on its own keeps its
/// real outcome.
fn kill(id: JobId, job: &ActiveJob) -> bool {
    let Ok(mut child) = job.child.lock() else {
        return false;
    };
    if !matches!(child.try_wait(), Ok(None)) {
        return false;
    }
    job.cancelled.store(true, Ordering::SeqCst);
    if let Err(e) = child.kill() {
        tracing::debug!("Killing job {} failed: {}", id, e);
    }
    tracing::info!("Cancelled job {} ({})", id, job.package);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let registry = JobRegistry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert!(b > a);
    }

    #[test]
    fn cancel_unknown_job_is_false() {
        let registry = JobRegistry::new();
        assert!(!registry.cancel(JobId(42)));
        assert_eq!(registry.cancel_all(), 0);
        assert!(registry.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn cancel_kills_registered_process() {
        let child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let child = Arc::new(Mutex::new(child));
        let cancelled = Arc::new(AtomicBool::new(false));

        let registry = JobRegistry::new();
        let id = registry.next_id();
        registry.register(
            id,
            ActiveJob {
                child: Arc::clone(&child),
                cancelled: Arc::clone(&cancelled),
                package: "slow".to_string(),
            },
        );
        assert_eq!(registry.active(), vec![(id, "slow".to_string())]);

        assert!(registry.cancel(id));
        assert!(cancelled.load(Ordering::SeqCst));
        let status = child.lock().unwrap().wait().unwrap();
        assert!(!status.success());

        registry.unregister(id);
        assert!(registry.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn cancel_after_exit_leaves_outcome_alone() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        child.wait().unwrap();
        let cancelled = Arc::new(AtomicBool::new(false));

        let registry = JobRegistry::new();
        let id = registry.next_id();
        registry.register(
            id,
            ActiveJob {
                child: Arc::new(Mutex::new(child)),
                cancelled: Arc::clone(&cancelled),
                package: "done".to_string(),
            },
        );

        assert!(!registry.cancel(id));
        assert_eq!(registry.cancel_all(), 0);
        assert!(!cancelled.load(Ordering::SeqCst));
    }
}
