//! External process execution and platform details.

pub mod command;
pub mod platform;

pub use command::{
    execute, execute_quiet, execute_streaming, CommandOptions, CommandResult,
    OutputCallback, OutputLine, ProcessCommand,
};
pub use platform::{is_ci, is_hidden_or_system, python_executable_candidates};
