//! The `pyport interpreter` command: show or save the interpreter selection.

use crate::cli::args::{InterpreterAction, InterpreterArgs};
use crate::config::resolve_executable;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct InterpreterCommand {
    context: CommandContext,
    args: InterpreterArgs,
}

impl InterpreterCommand {
    pub fn new(context: CommandContext, args: InterpreterArgs) -> Self {
        Self { context, args }
    }

    fn show(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let interpreter = self.context.interpreter(&settings)?;
        ui.message(&interpreter.executable.display().to_string());
        if ui.output_mode().shows_job_output() {
            ui.message(&format!(
                "  configured as {} (from {})",
                interpreter.configured.display(),
                interpreter.source
            ));
            match crate::packages::Pip::new(interpreter.executable.clone()).installed_names() {
                Ok(names) => ui.message(&format!("  {} packages installed", names.len())),
                Err(e) => tracing::debug!("Could not list installed packages: {}", e),
            }
        }
        Ok(CommandResult::success())
    }

    fn set(&self, ui: &mut dyn UserInterface, path: &std::path::Path) -> Result<CommandResult> {
        let mut settings = self.context.settings()?;
        let executable = resolve_executable(path)?;
        settings.python_path = Some(path.to_path_buf());
        settings.save(self.context.root())?;
        ui.success(&format!("Interpreter set to {}", executable.display()));
        Ok(CommandResult::success())
    }
}

impl Command for InterpreterCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &self.args.action {
            InterpreterAction::Show => self.show(ui),
            InterpreterAction::Set { path } => self.set(ui, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::PyportError;
    use crate::ui::MockUI;
    use tempfile::TempDir;

    fn command(root: &std::path::Path, action: InterpreterAction) -> InterpreterCommand {
        InterpreterCommand::new(
            CommandContext::new(root, None),
            InterpreterArgs { action },
        )
    }

    #[test]
    fn set_saves_a_valid_executable() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("python3");
        std::fs::write(&exe, "").unwrap();

        let mut ui = MockUI::new();
        command(temp.path(), InterpreterAction::Set { path: exe.clone() })
            .execute(&mut ui)
            .unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings.python_path, Some(exe));
        assert!(ui.has_success("Interpreter set to"));
    }

    #[test]
    fn set_rejects_folder_without_python() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();

        let mut ui = MockUI::new();
        let err = command(temp.path(), InterpreterAction::Set { path: empty })
            .execute(&mut ui)
            .unwrap_err();
        assert!(matches!(err, PyportError::InterpreterNotFound { .. }));
        assert!(Settings::load(temp.path()).unwrap().python_path.is_none());
    }

    #[test]
    fn show_without_configuration_is_an_interpreter_error() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();
        let err = command(temp.path(), InterpreterAction::Show)
            .execute(&mut ui)
            .unwrap_err();
        assert!(err.is_interpreter_error());
    }
}
