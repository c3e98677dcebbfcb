//! The `export` and `import-requirements` commands.

use std::fs;

use crate::cli::args::{ExportArgs, ImportRequirementsArgs};
use crate::error::Result;
use crate::jobs::JobSpec;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};
use super::display::{fail_spinner, run_batch};

pub struct ExportCommand {
    context: CommandContext,
    args: ExportArgs,
}

impl ExportCommand {
    pub fn new(context: CommandContext, args: ExportArgs) -> Self {
        Self { context, args }
    }
}

impl Command for ExportCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let pip = self.context.pip(&settings)?;
        let path = settings.requirements_path(self.context.root());

        let mut spinner = ui.start_spinner("Exporting requirements...");
        let manifest = match pip.export_requirements(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                return Ok(fail_spinner(
                    spinner.as_mut(),
                    &self.context.error_log(),
                    "Failed to export requirements.txt",
                    &e,
                ))
            }
        };

        if manifest.is_empty() {
            spinner.finish_skipped("No top-level packages found to export");
            return Ok(CommandResult::success());
        }
        spinner.finish_success(&format!("Requirements saved to {}", path.display()));

        if ui.output_mode().shows_job_output() {
            for line in manifest.lines() {
                ui.message(&format!("  {}", line));
            }
        }

        if let Some(copy) = &self.args.copy_to {
            if let Some(parent) = copy.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(copy, &manifest)?;
            ui.success(&format!("Requirements also saved to {}", copy.display()));
        }
        Ok(CommandResult::success())
    }
}

pub struct ImportRequirementsCommand {
    context: CommandContext,
    args: ImportRequirementsArgs,
}

impl ImportRequirementsCommand {
    pub fn new(context: CommandContext, args: ImportRequirementsArgs) -> Self {
        Self { context, args }
    }
}

impl Command for ImportRequirementsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let orchestrator = self.context.orchestrator(&settings)?;
        let file = self
            .args
            .file
            .clone()
            .unwrap_or_else(|| settings.requirements_path(self.context.root()));

        if !file.is_file() {
            let msg = format!("Requirements file not found: {}", file.display());
            ui.error(&msg);
            self.context.log_error(&msg);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        // Local wheel paths in the file are relative to its folder.
        let file = file.canonicalize()?;
        let mut spec = JobSpec::pip_install_requirements(orchestrator.interpreter(), &file);
        if let Some(dir) = file.parent() {
            spec = spec.with_cwd(dir);
        }

        ui.show_header(&format!("Installing packages from {}", file.display()));
        let report = run_batch(ui, |sink| orchestrator.run(spec, sink), None);

        if report.all_succeeded() {
            ui.success(&format!("Packages installed from {}", file.display()));
            return Ok(CommandResult::success());
        }

        let log = self.context.error_log();
        for outcome in report.failed() {
            log.record(&format!(
                "Failed to install some packages from {}:\n{}",
                file.display(),
                outcome.error.as_deref().unwrap_or("no output")
            ));
        }
        ui.error(&format!(
            "Some packages failed to install; details in {}",
            log.path().display()
        ));
        Ok(CommandResult::failure(EXIT_FAILURE))
    }
}
