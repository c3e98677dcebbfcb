//! Running, debugging and packaging scripts.

pub mod builder;
pub mod debugger;
pub mod runner;

pub use builder::{BuildLayout, Builder};
pub use debugger::{DebugOutput, DebugSession, OutputSplitter, Transcript};
pub use runner::ScriptRunner;
