//! Background install jobs.
//!
//! Each job runs one external process on a worker thread and reports
//! through an [`EventSink`]. The UI owns the receiving end of a
//! [`channel_sink`] and renders events on its own thread; workers never
//! touch it directly.
//!
//! ```no_run
//! use pyport::jobs::{channel_sink, Orchestrator};
//! use pyport::packages::{InterpreterProbe, PackageAliases, ProbeMode};
//! use std::sync::Arc;
//!
//! let python = "/media/usb/PPython/python.exe";
//! let probe = Arc::new(InterpreterProbe::new(python, ProbeMode::FindSpec));
//! let orchestrator = Orchestrator::new(python, probe, PackageAliases::default());
//!
//! let (sink, events) = channel_sink();
//! let plan = orchestrator.plan("import requests\n")?;
//! let batch = orchestrator.spawn(&plan, sink);
//! for event in events {
//!     println!("{}: {:?}", event.package, event.kind);
//! }
//! let report = batch.wait();
//! # Ok::<(), pyport::error::PyportError>(())
//! ```

pub mod event;
pub mod orchestrator;
pub mod registry;
pub mod runner;

pub use event::{
    channel_sink, null_sink, EventSink, JobEvent, JobEventKind, JobId, JobOutcome, JobStatus,
};
pub use orchestrator::{Batch, BatchReport, InstallPlan, MissingModule, Orchestrator};
pub use registry::JobRegistry;
pub use runner::{InstallJob, JobHandle, JobSpec};
