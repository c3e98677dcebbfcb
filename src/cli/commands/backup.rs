//! The `pyport backup` command.

use crate::cli::args::BackupArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::workspace::Backup;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct BackupCommand {
    context: CommandContext,
    args: BackupArgs,
}

impl BackupCommand {
    pub fn new(context: CommandContext, args: BackupArgs) -> Self {
        Self { context, args }
    }

    /// Freeze the interpreter's packages into the backup. A missing
    /// interpreter only costs the manifest, not the backup.
    fn write_requirements(&self, ui: &mut dyn UserInterface) -> bool {
        let settings = match self.context.settings() {
            Ok(settings) => settings,
            Err(e) => {
                ui.warning(&format!("Skipped requirements.txt: {}", e));
                return false;
            }
        };
        let frozen = self
            .context
            .pip(&settings)
            .and_then(|pip| pip.freeze());
        let path = self.args.destination.join("requirements.txt");
        match frozen.and_then(|text| std::fs::write(&path, text).map_err(Into::into)) {
            Ok(()) => {
                ui.success(&format!("Saved {}", path.display()));
                true
            }
            Err(e) => {
                ui.warning(&format!("Skipped requirements.txt: {}", e));
                self.context
                    .log_error(&format!("Backup requirements.txt failed: {}", e));
                false
            }
        }
    }
}

impl Command for BackupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let skip = self
            .args
            .skip
            .clone()
            .unwrap_or_else(|| settings.portable_dir.clone());
        let backup = Backup::new(self.context.root(), &self.args.destination, skip);

        let mut spinner = ui.start_spinner(&format!(
            "Backing up to {}...",
            self.args.destination.display()
        ));
        let report = match backup.run() {
            Ok(report) => report,
            Err(e) => {
                return Ok(super::display::fail_spinner(
                    spinner.as_mut(),
                    &self.context.error_log(),
                    "Backup failed",
                    &e,
                ))
            }
        };
        spinner.finish_success(&format!(
            "Copied {} items to {}",
            report.copied.len(),
            backup.destination().display()
        ));

        if ui.output_mode().shows_job_output() {
            for skipped in &report.skipped {
                ui.message(&format!("  skipped {}", skipped.display()));
            }
        }

        let log = self.context.error_log();
        for (entry, reason) in &report.failed {
            let msg = format!("Could not copy {}: {}", entry.display(), reason);
            ui.error(&msg);
            log.record(&msg);
        }

        if !self.args.no_requirements {
            self.write_requirements(ui);
        }

        Ok(CommandResult::from_success(report.is_complete()))
    }
}
