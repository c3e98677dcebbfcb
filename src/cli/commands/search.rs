//! The `search` and `replace` commands.
//!
//! Both match text literally and ignore case.

use crate::cli::args::{ReplaceArgs, SearchArgs};
use crate::error::Result;
use crate::ui::{Prompt, UserInterface};
use crate::workspace::TextSearch;

use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};

pub struct SearchCommand {
    args: SearchArgs,
}

impl SearchCommand {
    pub fn new(args: SearchArgs) -> Self {
        Self { args }
    }
}

impl Command for SearchCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let text = std::fs::read_to_string(&self.args.file)?;
        let search = TextSearch::new(&self.args.pattern)?;
        let matches = search.find_all(&text);

        if matches.is_empty() {
            ui.warning(&format!("'{}' not found", self.args.pattern));
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        let lines: Vec<&str> = text.lines().collect();
        for m in &matches {
            let source = lines.get(m.line - 1).copied().unwrap_or_default();
            ui.message(&format!("{}:{}: {}", m.line, m.column, source.trim_end()));
        }
        Ok(CommandResult::success())
    }
}

pub struct ReplaceCommand {
    args: ReplaceArgs,
}

impl ReplaceCommand {
    pub fn new(args: ReplaceArgs) -> Self {
        Self { args }
    }
}

impl Command for ReplaceCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let text = std::fs::read_to_string(&self.args.file)?;
        let search = TextSearch::new(&self.args.pattern)?;
        let (replaced, count) = search.replace_all(&text, &self.args.replacement);

        if count == 0 {
            ui.warning(&format!("'{}' not found", self.args.pattern));
            return Ok(CommandResult::success());
        }

        if !self.args.yes {
            let question = format!(
                "Replace {} occurrence{} of '{}' in {}?",
                count,
                if count == 1 { "" } else { "s" },
                self.args.pattern,
                self.args.file.display()
            );
            let confirmed = ui
                .prompt(&Prompt::confirm("replace", &question, true))?
                .as_bool()
                .unwrap_or(false);
            if !confirmed {
                ui.message("Nothing changed");
                return Ok(CommandResult::success());
            }
        }

        std::fs::write(&self.args.file, replaced)?;
        ui.success(&format!("Replaced {} occurrences", count));
        Ok(CommandResult::success())
    }
}
