//! The `install` and `install-missing` commands.

use std::time::{Duration, Instant};

use crate::cli::args::{InstallArgs, InstallMissingArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};
use super::display::{run_batch, show_batch_report};

pub struct InstallMissingCommand {
    context: CommandContext,
    args: InstallMissingArgs,
}

impl InstallMissingCommand {
    pub fn new(context: CommandContext, args: InstallMissingArgs) -> Self {
        Self { context, args }
    }
}

impl Command for InstallMissingCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let orchestrator = self.context.orchestrator(&settings)?;
        let source = std::fs::read_to_string(&self.args.script)?;

        let plan = orchestrator.plan(&source)?;
        if plan.is_satisfied() {
            ui.success(&format!(
                "All {} imports are installed",
                plan.imports.len()
            ));
            return Ok(CommandResult::success());
        }

        let dists = plan.distributions();
        ui.show_header(&format!("Installing {}", dists.join(", ")));
        let deadline = self
            .args
            .timeout
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let report = run_batch(ui, |sink| orchestrator.spawn(&plan, sink), deadline);

        let ok = show_batch_report(ui, &report, &self.context.error_log());
        Ok(CommandResult::from_success(ok))
    }
}

pub struct InstallCommand {
    context: CommandContext,
    args: InstallArgs,
}

impl InstallCommand {
    pub fn new(context: CommandContext, args: InstallArgs) -> Self {
        Self { context, args }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let orchestrator = self.context.orchestrator(&settings)?;

        let mut packages: Vec<String> = Vec::new();
        for package in &self.args.packages {
            if !packages.contains(package) {
                packages.push(package.clone());
            }
        }

        ui.show_header(&format!("Installing {}", packages.join(", ")));
        let report = run_batch(ui, |sink| orchestrator.install(&packages, sink), None);

        let ok = show_batch_report(ui, &report, &self.context.error_log());
        Ok(CommandResult::from_success(ok))
    }
}
