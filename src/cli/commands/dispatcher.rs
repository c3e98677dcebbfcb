//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;

/// Exit code for a command that ran but did not fully succeed.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when no usable interpreter is configured.
pub const EXIT_NO_INTERPRETER: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Success or [`EXIT_FAILURE`].
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::success()
        } else {
            Self::failure(EXIT_FAILURE)
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given context.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Dispatch and execute a command.
    ///
    /// Failures are shown through `ui` and appended to the error log here,
    /// so every command reports them the same way.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        let result = match &cli.command {
            Commands::Imports(args) => super::imports::ImportsCommand::new(args.clone()).execute(ui),
            Commands::Check(args) => super::check::CheckCommand::new(ctx, args.clone()).execute(ui),
            Commands::InstallMissing(args) => {
                super::install::InstallMissingCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Install(args) => {
                super::install::InstallCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::List => super::packages::ListCommand::new(ctx).execute(ui),
            Commands::Outdated => super::packages::OutdatedCommand::new(ctx).execute(ui),
            Commands::Upgrade(args) => {
                super::packages::UpgradeCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::UpdatePip => super::packages::UpdatePipCommand::new(ctx).execute(ui),
            Commands::Export(args) => {
                super::requirements::ExportCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::ImportRequirements(args) => {
                super::requirements::ImportRequirementsCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Run(args) => super::run::RunCommand::new(ctx, args.clone()).execute(ui),
            Commands::Debug(args) => super::debug::DebugCommand::new(ctx, args.clone()).execute(ui),
            Commands::Build(args) => super::build::BuildCommand::new(ctx, args.clone()).execute(ui),
            Commands::Backup(args) => {
                super::backup::BackupCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Launcher(args) => {
                super::launcher::LauncherCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Autosave(args) => {
                super::autosave::AutosaveCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Search(args) => {
                super::search::SearchCommand::new(args.clone()).execute(ui)
            }
            Commands::Replace(args) => {
                super::search::ReplaceCommand::new(args.clone()).execute(ui)
            }
            Commands::Interpreter(args) => {
                super::interpreter::InterpreterCommand::new(ctx, args.clone()).execute(ui)
            }
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
        };

        match result {
            Err(e) if e.is_interpreter_error() => {
                ui.error(&e.to_string());
                self.context.log_error(&e.to_string());
                Ok(CommandResult::failure(EXIT_NO_INTERPRETER))
            }
            Err(e) => {
                self.context.log_error(&e.to_string());
                Err(e)
            }
            ok => ok,
        }
    }
}
