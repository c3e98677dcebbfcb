//! The `pyport debug` command: drive pdb on a script.

use std::time::Duration;

use crate::cli::args::DebugArgs;
use crate::error::Result;
use crate::tools::{DebugOutput, DebugSession};
use crate::ui::{Prompt, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult, EXIT_FAILURE};

const QUIT: &str = "q";

pub struct DebugCommand {
    context: CommandContext,
    args: DebugArgs,
}

impl DebugCommand {
    pub fn new(context: CommandContext, args: DebugArgs) -> Self {
        Self { context, args }
    }

    /// Next command for pdb: scripted ones first, then the user's, then quit.
    fn next_command(
        &self,
        ui: &mut dyn UserInterface,
        scripted: &mut std::slice::Iter<'_, String>,
    ) -> String {
        if let Some(command) = scripted.next() {
            ui.message(&format!("(Pdb) {}", command));
            return command.clone();
        }
        if !ui.is_interactive() {
            return QUIT.to_string();
        }
        match ui.prompt(&Prompt::input("pdb", "(Pdb)")) {
            Ok(answer) => answer.as_string(),
            Err(e) => {
                tracing::debug!("Prompt ended: {}", e);
                QUIT.to_string()
            }
        }
    }
}

fn show_output(ui: &mut dyn UserInterface, output: &[DebugOutput]) {
    for item in output {
        match item {
            DebugOutput::Stdout(line) => ui.message(line.trim_end()),
            DebugOutput::Stderr(line) => ui.show_output_line("err", line.trim_end()),
            DebugOutput::Prompt | DebugOutput::Exited => {}
        }
    }
}

fn is_quit(command: &str) -> bool {
    matches!(command.trim(), "q" | "quit" | "exit")
}

impl Command for DebugCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.context.settings()?;
        let interpreter = self.context.interpreter(&settings)?;
        let timeout = Duration::from_secs(self.args.timeout);

        if !self.args.script.is_file() {
            let msg = format!("Script not found: {}", self.args.script.display());
            ui.error(&msg);
            self.context.log_error(&msg);
            return Ok(CommandResult::failure(EXIT_FAILURE));
        }

        ui.show_header(&format!("Debugging {}", self.args.script.display()));
        let mut session = DebugSession::start(&interpreter.executable, &self.args.script)?;
        let mut scripted = self.args.commands.iter();
        let mut quitting = false;

        loop {
            let transcript = session.read_until_prompt(timeout);
            show_output(ui, &transcript.output);

            if transcript.finished {
                break;
            }
            if !transcript.prompted {
                if quitting {
                    break;
                }
                ui.warning(&format!(
                    "pdb did not respond within {}s; stopping",
                    self.args.timeout
                ));
                let code = session.terminate()?;
                tracing::debug!("Debugger terminated with {:?}", code);
                return Ok(CommandResult::failure(EXIT_FAILURE));
            }

            let command = self.next_command(ui, &mut scripted);
            quitting = is_quit(&command);
            session.send(&command)?;
        }

        let code = if quitting {
            session.terminate()?
        } else {
            session.wait()?
        };
        ui.success("Debug session ended");
        tracing::debug!("pdb exit status {:?}", code);
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_quit_commands() {
        assert!(is_quit("q"));
        assert!(is_quit(" quit "));
        assert!(is_quit("exit"));
        assert!(!is_quit("c"));
        assert!(!is_quit("p quit"));
    }

    fn command(commands: &[&str]) -> DebugCommand {
        DebugCommand::new(
            CommandContext::new(std::path::Path::new("."), None),
            DebugArgs {
                script: "game.py".into(),
                commands: commands.iter().map(|c| c.to_string()).collect(),
                timeout: 1,
            },
        )
    }

    #[test]
    fn scripted_commands_run_before_prompting() {
        let cmd = command(&["n", "p x"]);
        let mut scripted = cmd.args.commands.iter();
        let mut ui = crate::ui::MockUI::new();
        ui.set_interactive(true);
        ui.queue_prompt_responses("pdb", vec!["c"]);

        assert_eq!(cmd.next_command(&mut ui, &mut scripted), "n");
        assert_eq!(cmd.next_command(&mut ui, &mut scripted), "p x");
        assert_eq!(cmd.next_command(&mut ui, &mut scripted), "c");
        assert!(ui.has_message("(Pdb) p x"));
        assert_eq!(ui.prompts_shown(), ["pdb"]);
    }

    #[test]
    fn non_interactive_quits_once_commands_run_out() {
        let cmd = command(&["n"]);
        let mut scripted = cmd.args.commands.iter();
        let mut ui = crate::ui::MockUI::new();

        assert_eq!(cmd.next_command(&mut ui, &mut scripted), "n");
        assert_eq!(cmd.next_command(&mut ui, &mut scripted), QUIT);
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn shows_stdout_as_messages_and_stderr_tagged() {
        let mut ui = crate::ui::MockUI::new();
        show_output(
            &mut ui,
            &[
                DebugOutput::Stdout("> script.py(1)<module>()\n".to_string()),
                DebugOutput::Stderr("Traceback".to_string()),
                DebugOutput::Prompt,
            ],
        );
        assert!(ui.has_message("> script.py(1)<module>()"));
        assert_eq!(ui.output_lines().len(), 1);
    }
}
