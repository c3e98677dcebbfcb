//! The `pyport run` command.
//!
//! Installs whatever the script imports that is missing, then runs it with
//! the portable interpreter. Output lines are shown as they arrive, tagged
//! `[out]` or `[err]`.

use std::sync::mpsc;
use std::thread;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::shell::OutputLine;
use crate::tools::ScriptRunner;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};
use super::display::{run_batch, show_batch_report};

pub struct RunCommand {
    context: CommandContext,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(context: CommandContext, args: RunArgs) -> Self {
        Self { context, args }
    }

    /// Install missing imports. Returns false when the script cannot be
    /// parsed or an install failed.
    fn resolve(&self, ui: &mut dyn UserInterface) -> Result<bool> {
        let settings = self.context.settings()?;
        let orchestrator = self.context.orchestrator(&settings)?;
        let source = std::fs::read_to_string(&self.args.script)?;

        let plan = match orchestrator.plan(&source) {
            Ok(plan) => plan,
            Err(e) => {
                ui.error(&e.to_string());
                self.context.log_error(&e.to_string());
                return Ok(false);
            }
        };
        if plan.is_satisfied() {
            tracing::debug!("All imports of {} are installed", self.args.script.display());
            return Ok(true);
        }

        ui.show_header(&format!(
            "Installing missing packages: {}",
            plan.distributions().join(", ")
        ));
        let report = run_batch(ui, |sink| orchestrator.spawn(&plan, sink), None);
        Ok(show_batch_report(ui, &report, &self.context.error_log()))
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let interpreter = self.context.interpreter(&settings)?;

        if !self.args.no_resolve && !self.resolve(ui)? {
            ui.warning("Running anyway; the script may fail to import");
        }

        ui.show_header(&format!("Running {}", self.args.script.display()));
        let runner = ScriptRunner::new(&interpreter.executable);

        // The callback must be 'static, so lines come back over a channel
        // and only this thread writes to the UI.
        let (tx, rx) = mpsc::channel::<OutputLine>();
        let script = self.args.script.clone();
        let args = self.args.args.clone();
        let worker = thread::spawn(move || {
            let tx = std::sync::Mutex::new(tx);
            runner.run(
                &script,
                &args,
                Box::new(move |line| {
                    if let Ok(tx) = tx.lock() {
                        let _ = tx.send(line);
                    }
                }),
            )
        });

        for line in rx.iter() {
            match line {
                OutputLine::Stdout(text) => ui.show_output_line("out", text.trim_end()),
                OutputLine::Stderr(text) => ui.show_output_line("err", text.trim_end()),
            }
        }

        let result = match worker.join() {
            Ok(result) => result?,
            Err(_) => {
                ui.error("Script runner panicked");
                return Ok(CommandResult::failure(EXIT_FAILURE));
            }
        };

        match result.exit_code {
            Some(0) => {
                ui.success(&format!("Finished in {:.1?}", result.duration));
                Ok(CommandResult::success())
            }
            code => {
                let msg = format!(
                    "{} exited with {}",
                    self.args.script.display(),
                    code.map_or("a signal".to_string(), |c| format!("status {}", c))
                );
                ui.error(&msg);
                if !result.stderr.trim().is_empty() {
                    self.context.log_error(&format!("{}\n{}", msg, result.stderr.trim()));
                } else {
                    self.context.log_error(&msg);
                }
                Ok(CommandResult::failure(code.unwrap_or(EXIT_FAILURE)))
            }
        }
    }
}
