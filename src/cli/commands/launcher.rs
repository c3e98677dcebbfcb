//! The `pyport launcher` command.

use crate::cli::args::{LauncherArgs, LauncherKindArg};
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workspace::{Launcher, LauncherKind};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};

impl From<LauncherKindArg> for LauncherKind {
    fn from(arg: LauncherKindArg) -> Self {
        match arg {
            LauncherKindArg::Vbs => LauncherKind::ScriptHost,
            LauncherKindArg::Sh => LauncherKind::Shell,
        }
    }
}

pub struct LauncherCommand {
    context: CommandContext,
    args: LauncherArgs,
}

impl LauncherCommand {
    pub fn new(context: CommandContext, args: LauncherArgs) -> Self {
        Self { context, args }
    }
}

impl Command for LauncherCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;

        if !self.args.script.is_file() {
            let msg = format!("Script not found: {}", self.args.script.display());
            ui.error(&msg);
            self.context.log_error(&msg);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        let kind = self.args.kind.map_or_else(LauncherKind::native, Into::into);
        let path = Launcher::new(kind, settings.portable_dir).write(&self.args.script)?;
        ui.success(&format!("Created {}", path.display()));
        Ok(CommandResult::success())
    }
}
