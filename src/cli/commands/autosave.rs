//! The `pyport autosave` command.

use std::io::Read;
use std::path::Path;

use crate::cli::args::AutosaveArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workspace::{AutosaveOutcome, Autosaver};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct AutosaveCommand {
    context: CommandContext,
    args: AutosaveArgs,
}

impl AutosaveCommand {
    pub fn new(context: CommandContext, args: AutosaveArgs) -> Self {
        Self { context, args }
    }

    fn read_code(&self) -> Result<String> {
        match self.args.source.as_deref() {
            Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
            _ => {
                let mut code = String::new();
                std::io::stdin().read_to_string(&mut code)?;
                Ok(code)
            }
        }
    }
}

impl Command for AutosaveCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let code = self.read_code()?;
        let autosaver = Autosaver::new(settings.autosave_path(self.context.root()));

        match autosaver.save(&code, self.args.current.as_deref())? {
            AutosaveOutcome::Empty => ui.warning("Nothing to save"),
            AutosaveOutcome::Overwrote(path) => {
                ui.success(&format!("Saved {}", path.display()))
            }
            AutosaveOutcome::Created(path) => {
                ui.success(&format!("Autosaved to {}", path.display()))
            }
        }
        Ok(CommandResult::success())
    }
}
