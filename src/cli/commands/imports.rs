//! The `pyport imports` command: list what a script imports.

use crate::cli::args::ScriptArgs;
use crate::error::Result;
use crate::imports::{extract_imports, scan_imports};
use crate::ui::{PyportTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};

pub struct ImportsCommand {
    args: ScriptArgs,
}

impl ImportsCommand {
    pub fn new(args: ScriptArgs) -> Self {
        Self { args }
    }
}

impl Command for ImportsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let source = std::fs::read_to_string(&self.args.script)?;

        if ui.output_mode().shows_job_output() {
            let theme = PyportTheme::detect();
            for import in scan_imports(&source)? {
                let shown = if import.is_relative() {
                    format!("{}{}", ".".repeat(import.level), import.module)
                } else {
                    import.module.clone()
                };
                let note = if import.is_relative() { " (relative, ignored)" } else { "" };
                ui.message(&format!(
                    "{} {}{}",
                    theme.dim.apply_to(format!("{:>4}:", import.line)),
                    shown,
                    theme.dim.apply_to(note)
                ));
            }
            ui.message("");
        }

        let imports = extract_imports(&source)?;
        if imports.is_empty() {
            ui.message("No imports found");
        }
        for module in imports.iter() {
            ui.message(module);
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{MockUI, OutputMode};
    use tempfile::TempDir;

    fn command(source: &str) -> (TempDir, ImportsCommand) {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("game.py");
        std::fs::write(&script, source).unwrap();
        (temp, ImportsCommand::new(ScriptArgs { script }))
    }

    #[test]
    fn lists_top_level_modules() {
        let (_temp, cmd) = command("import os\nfrom PIL import Image\nfrom . import sibling\n");
        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();
        assert_eq!(ui.messages(), ["PIL", "os"]);
    }

    #[test]
    fn verbose_shows_each_statement_with_line() {
        let (_temp, cmd) = command("import os\nfrom . import sibling\n");
        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        cmd.execute(&mut ui).unwrap();
        assert!(ui.has_message("relative, ignored"));
        assert!(ui.messages().iter().any(|m| m.contains("1:") && m.contains("os")));
        assert_eq!(ui.messages().last().map(String::as_str), Some("os"));
    }

    #[test]
    fn script_without_imports() {
        let (_temp, cmd) = command("print('hi')\n");
        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();
        assert!(ui.has_message("No imports found"));
    }
}
