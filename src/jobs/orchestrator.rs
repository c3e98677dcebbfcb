//! Finds a script's missing imports and installs them concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::event::{EventSink, JobOutcome};
use super::registry::JobRegistry;
use super::runner::{InstallJob, JobHandle, JobSpec};
use crate::error::Result;
use crate::imports::{extract_imports, ImportSet};
use crate::packages::{ModuleProbe, PackageAliases, ProbeOutcome};

const WAIT_POLL: Duration = Duration::from_millis(25);

/// A module the probe could not find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingModule {
    pub module: String,
    pub distribution: String,
    pub outcome: ProbeOutcome,
}

/// What a script needs.
#[derive(Debug, Clone, Default)]
pub struct InstallPlan {
    pub imports: ImportSet,
    /// Modules that are already importable, sorted.
    pub available: Vec<String>,
    /// Modules that are not, sorted by module name.
    pub missing: Vec<MissingModule>,
}

impl InstallPlan {
    /// Distributions to install, one per distinct name, in plan order.
    pub fn distributions(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.missing
            .iter()
            .filter(|m| seen.insert(m.distribution.clone()))
            .map(|m| m.distribution.clone())
            .collect()
    }

    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Outcomes of every job in a batch, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// True when every job succeeded (vacuously for an empty batch).
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::succeeded)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Jobs started together and waited on together.
#[derive(Debug)]
pub struct Batch {
    registry: Arc<JobRegistry>,
    handles: Vec<JobHandle>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(JobHandle::is_finished)
    }

    /// Cancel every job in this batch that is still running.
    pub fn cancel_all(&self) -> usize {
        self.handles
            .iter()
            .filter(|h| self.registry.cancel(h.id()))
            .count()
    }

    /// Block until every job has completed.
    pub fn wait(self) -> BatchReport {
        BatchReport {
            outcomes: self.handles.into_iter().map(JobHandle::join).collect(),
        }
    }

    /// Like [`Batch::wait`], but cancels whatever is still running once
    /// `deadline` passes.
    pub fn wait_until(self, deadline: Instant) -> BatchReport {
        while !self.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!("Install deadline passed, cancelling remaining jobs");
                // Repeat until done: a job may not have registered its
                // process yet on the first pass.
                while !self.is_finished() {
                    self.cancel_all();
                    thread::sleep(WAIT_POLL);
                }
                break;
            }
            thread::sleep(WAIT_POLL);
        }
        self.wait()
    }
}

/// Ties extraction, probing, name resolution and install jobs together.
pub struct Orchestrator {
    interpreter: PathBuf,
    probe: Arc<dyn ModuleProbe>,
    aliases: PackageAliases,
    registry: Arc<JobRegistry>,
}

impl Orchestrator {
    pub fn new(
        interpreter: impl Into<PathBuf>,
        probe: Arc<dyn ModuleProbe>,
        aliases: PackageAliases,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            probe,
            aliases,
            registry: Arc::new(JobRegistry::new()),
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Extract the imports of `source`, probe each and resolve the misses.
    ///
    /// Only a syntax error in `source` is returned as an error; probe
    /// failures count as missing modules.
    pub fn plan(&self, source: &str) -> Result<InstallPlan> {
        let imports = extract_imports(source)?;
        let mut available = Vec::new();
        let mut missing = Vec::new();

        for module in imports.iter() {
            match self.probe.probe(module) {
                ProbeOutcome::Available => available.push(module.to_string()),
                outcome => {
                    if let ProbeOutcome::Failed { reason } = &outcome {
                        tracing::warn!("Probe for {} failed: {}", module, reason);
                    }
                    missing.push(MissingModule {
                        module: module.to_string(),
                        distribution: self.aliases.resolve(module),
                        outcome,
                    });
                }
            }
        }

        tracing::info!(
            "{} imports, {} available, {} missing",
            imports.len(),
            available.len(),
            missing.len()
        );
        Ok(InstallPlan {
            imports,
            available,
            missing,
        })
    }

    /// Start one install job per distribution the plan is missing.
    pub fn spawn(&self, plan: &InstallPlan, sink: EventSink) -> Batch {
        self.install(&plan.distributions(), sink)
    }

    /// Start one install job per named distribution.
    pub fn install(&self, packages: &[String], sink: EventSink) -> Batch {
        let handles = packages
            .iter()
            .map(|dist| {
                let spec = JobSpec::pip_install(&self.interpreter, dist);
                InstallJob::spawn(spec, &self.registry, Arc::clone(&sink))
            })
            .collect();
        Batch {
            registry: Arc::clone(&self.registry),
            handles,
        }
    }

    /// Start a job running an arbitrary spec in this orchestrator's registry.
    pub fn run(&self, spec: JobSpec, sink: EventSink) -> Batch {
        Batch {
            registry: Arc::clone(&self.registry),
            handles: vec![InstallJob::spawn(spec, &self.registry, sink)],
        }
    }

    /// Plan, install every miss and wait for all of them.
    pub fn resolve_missing(&self, source: &str, sink: EventSink) -> Result<BatchReport> {
        let plan = self.plan(source)?;
        Ok(self.spawn(&plan, sink).wait())
    }

    /// Cancel every job this orchestrator started that is still running.
    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PyportError;
    use crate::jobs::event::{channel_sink, null_sink, JobEventKind, JobStatus};
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// Probe that knows a fixed set of modules and records what it was asked.
    struct FakeProbe {
        available: BTreeSet<String>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(available: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                available: available.iter().map(|s| s.to_string()).collect(),
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    impl ModuleProbe for FakeProbe {
        fn probe(&self, module: &str) -> ProbeOutcome {
            self.asked.lock().unwrap().push(module.to_string());
            if module == "explodes" {
                ProbeOutcome::Failed {
                    reason: "RuntimeError".to_string(),
                }
            } else if self.available.contains(module) {
                ProbeOutcome::Available
            } else {
                ProbeOutcome::Missing
            }
        }
    }

    fn orchestrator(interpreter: &Path, available: &[&str]) -> Orchestrator {
        Orchestrator::new(interpreter, FakeProbe::new(available), PackageAliases::default())
    }

    #[test]
    fn plan_probes_in_sorted_order_and_resolves_misses() {
        let probe = FakeProbe::new(&["os", "sys"]);
        let orch = Orchestrator::new("python", probe.clone(), PackageAliases::default());

        let plan = orch
            .plan("import sys\nimport PIL.Image\nimport os\nfrom yaml import safe_load\n")
            .unwrap();

        assert_eq!(
            *probe.asked.lock().unwrap(),
            vec!["PIL", "os", "sys", "yaml"]
        );
        assert_eq!(plan.available, vec!["os", "sys"]);
        assert_eq!(plan.distributions(), vec!["Pillow", "PyYAML"]);
    }

    #[test]
    fn failed_probe_counts_as_missing() {
        let orch = orchestrator(Path::new("python"), &[]);
        let plan = orch.plan("import explodes\n").unwrap();
        assert_eq!(plan.missing.len(), 1);
        assert!(matches!(
            plan.missing[0].outcome,
            ProbeOutcome::Failed { .. }
        ));
    }

    #[test]
    fn shared_distribution_is_installed_once() {
        let orch = orchestrator(Path::new("python"), &[]);
        let plan = orch.plan("import win32api\nimport win32con\n").unwrap();
        assert_eq!(plan.missing.len(), 2);
        assert_eq!(plan.distributions(), vec!["pywin32"]);
    }

    #[test]
    fn syntax_error_is_the_only_error() {
        let orch = orchestrator(Path::new("python"), &[]);
        let err = orch.plan("import (\n").unwrap_err();
        assert!(matches!(err, PyportError::Parse { .. }));
    }

    #[test]
    fn empty_batch_completes_immediately() {
        let orch = orchestrator(Path::new("/no/such/python"), &["os"]);
        let (sink, rx) = channel_sink();

        let report = orch.resolve_missing("import os\n", sink).unwrap();

        assert!(report.is_empty());
        assert!(report.all_succeeded());
        assert!(rx.try_iter().next().is_none());
    }

    #[cfg(unix)]
    fn fake_interpreter() -> tempfile::TempDir {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let python = temp.path().join("python");
        std::fs::write(
            &python,
            "#!/bin/sh\nname=\"$4\"\ncase \"$name\" in\n  broken*) echo \"Collecting $name\"; echo \"ERROR: No matching distribution found for $name\" >&2; exit 1 ;;\n  slow*) exec sleep 30 ;;\n  *) echo \"Collecting $name\"; echo \"Successfully installed $name\" ;;\nesac\n",
        )
        .unwrap();
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
        temp
    }

    #[cfg(unix)]
    #[test]
    fn one_available_one_missing_spawns_exactly_one_job() {
        let temp = fake_interpreter();
        let orch = orchestrator(&temp.path().join("python"), &["os"]);
        let (sink, rx) = channel_sink();

        let report = orch
            .resolve_missing("import os\nimport requests\n", sink)
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.outcomes[0].package, "requests");
        assert!(report.all_succeeded());

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.iter().filter(|e| e.is_completion()).count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failing_job_does_not_affect_sibling() {
        let temp = fake_interpreter();
        let orch = orchestrator(&temp.path().join("python"), &[]);
        let (sink, rx) = channel_sink();

        let report = orch
            .resolve_missing("import brokenpkg\nimport requests\n", sink)
            .unwrap();

        assert_eq!(report.len(), 2);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].package, "brokenpkg");
        assert_eq!(
            failed[0].error.as_deref(),
            Some("ERROR: No matching distribution found for brokenpkg")
        );
        assert_eq!(report.succeeded().count(), 1);

        let events: Vec<_> = rx.iter().collect();
        for package in ["brokenpkg", "requests"] {
            let mine: Vec<_> = events.iter().filter(|e| e.package == package).collect();
            assert_eq!(mine.iter().filter(|e| e.is_completion()).count(), 1);
            assert!(mine.last().is_some_and(|e| e.is_completion()));
        }
        assert!(events.iter().any(|e| e.package == "brokenpkg"
            && e.kind
                == JobEventKind::Error(
                    "ERROR: No matching distribution found for brokenpkg".to_string()
                )));
    }

    #[cfg(unix)]
    #[test]
    fn completion_waits_for_every_job() {
        let temp = fake_interpreter();
        let orch = orchestrator(&temp.path().join("python"), &[]);
        let packages: Vec<String> = (0..5).map(|i| format!("pkg{}", i)).collect();

        let report = orch.install(&packages, null_sink()).wait();

        assert_eq!(report.len(), 5);
        assert!(report.all_succeeded());
        assert!(orch.registry().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn deadline_cancels_remaining_jobs() {
        let temp = fake_interpreter();
        let orch = orchestrator(&temp.path().join("python"), &[]);
        let packages = vec!["slowpkg".to_string(), "quick".to_string()];

        let batch = orch.install(&packages, null_sink());
        let report = batch.wait_until(Instant::now() + Duration::from_millis(500));

        let slow = &report.outcomes[0];
        let quick = &report.outcomes[1];
        assert_eq!(slow.status, JobStatus::Cancelled);
        assert_eq!(quick.status, JobStatus::Succeeded);
    }
}
