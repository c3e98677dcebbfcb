//! The `pyport build` command.

use crate::cli::args::BuildArgs;
use crate::error::Result;
use crate::shell::{OutputCallback, OutputLine};
use crate::tools::Builder;
use crate::ui::{live_output_callback, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};
use super::display::fail_spinner;

pub struct BuildCommand {
    context: CommandContext,
    args: BuildArgs,
}

impl BuildCommand {
    pub fn new(context: CommandContext, args: BuildArgs) -> Self {
        Self { context, args }
    }

    fn name(&self) -> Option<String> {
        self.args.name.clone().or_else(|| {
            self.args
                .script
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from)
        })
    }
}

fn log_callback() -> OutputCallback {
    Box::new(|line| match line {
        OutputLine::Stdout(text) | OutputLine::Stderr(text) => {
            tracing::debug!("pyinstaller: {}", text.trim_end())
        }
    })
}

impl Command for BuildCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let interpreter = self.context.interpreter(&settings)?;

        if !self.args.script.is_file() {
            let msg = format!("Script not found: {}", self.args.script.display());
            ui.error(&msg);
            self.context.log_error(&msg);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }
        let Some(name) = self.name() else {
            ui.error("Pass --name; the script's file name cannot be used");
            return Ok(CommandResult::failure(EXIT_FAILURE));
        };

        let base = format!("Building {}...", name);
        let mut spinner = ui.start_spinner(&base);
        let callback = match spinner.progress_bar() {
            Some(bar) => live_output_callback(bar, base, 4, 3),
            None => log_callback(),
        };

        let builder = Builder::new(&interpreter.executable);
        match builder.build(&self.args.script, &name, &self.args.output, callback) {
            Ok(executable) => {
                spinner.finish_success(&format!("Built {}", executable.display()));
                Ok(CommandResult::success())
            }
            Err(e) => Ok(fail_spinner(
                spinner.as_mut(),
                &self.context.error_log(),
                &format!("Failed to build {}", name),
                &e,
            )),
        }
    }
}
