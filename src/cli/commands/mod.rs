//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands that touch the
//! interpreter get it through [`CommandContext`], so a missing interpreter
//! is reported the same way everywhere.

pub mod autosave;
pub mod backup;
pub mod build;
pub mod check;
pub mod completions;
pub mod context;
pub mod debug;
pub mod dispatcher;
pub mod display;
pub mod imports;
pub mod install;
pub mod interpreter;
pub mod launcher;
pub mod packages;
pub mod requirements;
pub mod run;
pub mod search;

pub use context::CommandContext;
pub use dispatcher::{Command, CommandDispatcher, CommandResult, EXIT_FAILURE, EXIT_NO_INTERPRETER};
