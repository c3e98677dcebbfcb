//! Package maintenance commands: `list`, `outdated`, `upgrade` and
//! `update-pip`.

use crate::cli::args::UpgradeArgs;
use crate::error::Result;
use crate::ui::{PyportTheme, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};
use super::display::fail_spinner;

pub struct ListCommand {
    context: CommandContext,
}

impl ListCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let pip = self.context.pip(&settings)?;

        let mut spinner = ui.start_spinner("Listing installed packages...");
        let listing = match pip.list() {
            Ok(listing) => listing,
            Err(e) => {
                return Ok(fail_spinner(
                    spinner.as_mut(),
                    &self.context.error_log(),
                    "Could not list packages",
                    &e,
                ))
            }
        };
        spinner.finish_success("Installed packages");

        for line in listing.lines() {
            ui.message(line);
        }
        Ok(CommandResult::success())
    }
}

pub struct OutdatedCommand {
    context: CommandContext,
}

impl OutdatedCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for OutdatedCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let pip = self.context.pip(&settings)?;

        let mut spinner = ui.start_spinner("Checking for outdated packages...");
        let outdated = match pip.outdated() {
            Ok(outdated) => outdated,
            Err(e) => {
                return Ok(fail_spinner(
                    spinner.as_mut(),
                    &self.context.error_log(),
                    "Could not check for updates",
                    &e,
                ))
            }
        };

        if outdated.is_empty() {
            spinner.finish_success("All packages are up to date");
            return Ok(CommandResult::success());
        }
        spinner.finish_success(&format!("{} outdated packages", outdated.len()));

        let theme = PyportTheme::detect();
        let width = outdated.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for package in &outdated {
            ui.message(&format!(
                "  {:<width$}  {} {} {}",
                package.name,
                theme.dim.apply_to(&package.version),
                theme.dim.apply_to("→"),
                theme.success.apply_to(&package.latest_version),
                width = width
            ));
        }
        Ok(CommandResult::success())
    }
}

pub struct UpgradeCommand {
    context: CommandContext,
    args: UpgradeArgs,
}

impl UpgradeCommand {
    pub fn new(context: CommandContext, args: UpgradeArgs) -> Self {
        Self { context, args }
    }

    fn upgrade_named(&self, ui: &mut dyn UserInterface, pip: &crate::packages::Pip) -> bool {
        let log = self.context.error_log();
        let mut ok = true;
        for name in &self.args.packages {
            let mut spinner = ui.start_spinner(&format!("Upgrading {}...", name));
            match pip.upgrade(name) {
                Ok(()) => {
                    let version = pip.show_version(name).ok().flatten();
                    match version {
                        Some(v) => spinner.finish_success(&format!("{} {}", name, v)),
                        None => spinner.finish_success(&format!("{} upgraded", name)),
                    }
                }
                Err(e) => {
                    fail_spinner(
                        spinner.as_mut(),
                        &log,
                        &format!("Failed to upgrade {}", name),
                        &e,
                    );
                    ok = false;
                }
            }
        }
        ok
    }
}

impl Command for UpgradeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let pip = self.context.pip(&settings)?;

        if !self.args.packages.is_empty() {
            let ok = self.upgrade_named(ui, &pip);
            return Ok(CommandResult::from_success(ok));
        }

        let mut spinner = ui.start_spinner("Upgrading outdated packages...");
        let report = match pip.upgrade_outdated() {
            Ok(report) => report,
            Err(e) => {
                return Ok(fail_spinner(
                    spinner.as_mut(),
                    &self.context.error_log(),
                    "Could not upgrade packages",
                    &e,
                ))
            }
        };

        if report.is_empty() {
            spinner.finish_skipped("All packages are up to date");
            return Ok(CommandResult::success());
        }
        spinner.finish_success(&format!("Upgraded {} packages", report.upgraded.len()));

        for (name, version) in &report.upgraded {
            ui.success(&format!("{} {}", name, version));
        }
        let log = self.context.error_log();
        for name in &report.failed {
            ui.error(&format!("Failed to upgrade {}", name));
            log.record(&format!("Failed to upgrade {}", name));
        }
        Ok(CommandResult::from_success(report.failed.is_empty()))
    }
}

pub struct UpdatePipCommand {
    context: CommandContext,
}

impl UpdatePipCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for UpdatePipCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let pip = self.context.pip(&settings)?;

        let mut spinner = ui.start_spinner("Updating pip...");
        match pip.update_pip() {
            Ok(output) => {
                spinner.finish_success("pip is up to date");
                if ui.output_mode().shows_job_output() {
                    for line in output.lines() {
                        ui.show_output_line("pip", line);
                    }
                }
                Ok(CommandResult::success())
            }
            Err(e) => Ok(fail_spinner(
                spinner.as_mut(),
                &self.context.error_log(),
                "Failed to update pip",
                &e,
            )),
        }
    }
}
