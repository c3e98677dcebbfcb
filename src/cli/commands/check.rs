//! The `pyport check` command: show which imports of a script are missing.

use crate::cli::args::ScriptArgs;
use crate::error::Result;
use crate::packages::ProbeOutcome;
use crate::ui::{PyportTheme, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct CheckCommand {
    context: CommandContext,
    args: ScriptArgs,
}

impl CheckCommand {
    pub fn new(context: CommandContext, args: ScriptArgs) -> Self {
        Self { context, args }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let orchestrator = self.context.orchestrator(&settings)?;
        let source = std::fs::read_to_string(&self.args.script)?;

        let mut spinner = ui.start_spinner("Checking imports...");
        let plan = match orchestrator.plan(&source) {
            Ok(plan) => plan,
            Err(e) => {
                spinner.finish_error("Could not read imports");
                return Err(e);
            }
        };
        spinner.finish_success(&format!("Checked {} imports", plan.imports.len()));

        let theme = PyportTheme::detect();
        for module in &plan.available {
            ui.success(module);
        }
        for miss in &plan.missing {
            let dist = if miss.distribution != miss.module {
                format!(" {}", theme.dim.apply_to(format!("(pip: {})", miss.distribution)))
            } else {
                String::new()
            };
            match &miss.outcome {
                ProbeOutcome::Failed { reason } => {
                    ui.warning(&format!("{}{}: probe failed: {}", miss.module, dist, reason))
                }
                _ => ui.error(&format!("{}{} is not installed", miss.module, dist)),
            }
        }

        if plan.is_satisfied() {
            ui.success("All imports are installed");
        } else {
            ui.message(&format!(
                "Run 'pyport install-missing {}' to install {}",
                self.args.script.display(),
                plan.distributions().join(", ")
            ));
        }
        Ok(CommandResult::from_success(plan.is_satisfied()))
    }
}
