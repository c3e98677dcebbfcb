//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{PyportError, Result};
use crate::jobs::{JobEvent, JobEventKind, JobId};

use super::progress::completion_line;
use super::theme::PyportTheme;
use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts.
pub const PROMPT_ENV_PREFIX: &str = "PYPORT_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Job output is printed line by line as `[package] line` instead of
/// redrawn, which keeps logs readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
    theme: PyportTheme,
    errors: HashMap<JobId, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();
        Self::with_overrides(mode, env_overrides)
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
            theme: PyportTheme::plain(),
            errors: HashMap::new(),
        }
    }

    fn answer(&self, prompt: &Prompt) -> Option<String> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        self.env_overrides
            .get(&env_key)
            .or(prompt.default.as_ref())
            .cloned()
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        println!("{}", msg);
    }

    fn success(&mut self, msg: &str) {
        println!("{}", self.theme.format_success(msg));
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let Some(value) = self.answer(prompt) else {
            return Err(PyportError::ConfigValidationError {
                message: format!(
                    "Cannot prompt for '{}' in non-interactive mode (set {}{})",
                    prompt.key,
                    PROMPT_ENV_PREFIX,
                    prompt.key.to_uppercase()
                ),
            });
        };

        match prompt.prompt_type {
            PromptType::Confirm => match super::parse_bool(&value) {
                Some(b) => Ok(PromptResult::Bool(b)),
                None => Err(PyportError::ConfigValidationError {
                    message: format!("'{}' is not a yes/no answer for '{}'", value, prompt.key),
                }),
            },
            PromptType::Input => Ok(PromptResult::String(value)),
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_progress() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            theme: self.theme.clone(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            println!("\n{}\n", title);
        }
    }

    fn show_output_line(&mut self, tag: &str, line: &str) {
        println!("{}", self.theme.format_tagged(tag, line));
    }

    fn job_event(&mut self, event: &JobEvent) {
        match &event.kind {
            JobEventKind::Progress(line) => {
                if self.mode.shows_job_output() {
                    println!("{}", self.theme.format_tagged(&event.package, line.trim_end()));
                }
            }
            JobEventKind::Error(stderr) | JobEventKind::Skipped(stderr) => {
                if self.mode.shows_job_output() {
                    for line in stderr.lines() {
                        eprintln!("{}", self.theme.format_tagged(&event.package, line));
                    }
                }
                let last = stderr.lines().rev().find(|l| !l.trim().is_empty());
                if let Some(last) = last {
                    self.errors.insert(event.job, last.trim().to_string());
                }
            }
            JobEventKind::Completed(outcome) => {
                let reason = self.errors.remove(&event.job);
                let line = completion_line(&self.theme, outcome, reason.as_deref());
                if outcome.succeeded() {
                    if self.mode.shows_progress() {
                        println!("  {}", line);
                    }
                } else {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prints the final status of an operation instead of animating it.
/// Prints the final line only.
struct NoopSpinner {
    theme: PyportTheme,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        println!("  {}", self.theme.format_success(msg));
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("  {}", self.theme.format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        println!("  {}", self.theme.format_skipped(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_with(key: &str, value: &str) -> NonInteractiveUI {
        let mut overrides = HashMap::new();
        overrides.insert(key.to_string(), value.to_string());
        NonInteractiveUI::with_overrides(OutputMode::Quiet, overrides)
    }

    #[test]
    fn prompt_uses_env_override() {
        let mut ui = ui_with("PYPORT_PROMPT_REPLACE", "yes");
        let result = ui
            .prompt(&Prompt::confirm("replace", "Replace?", false))
            .unwrap();
        assert_eq!(result, PromptResult::Bool(true));
    }

    #[test]
    fn prompt_falls_back_to_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Quiet, HashMap::new());
        let result = ui
            .prompt(&Prompt::confirm("replace", "Replace?", false))
            .unwrap();
        assert_eq!(result, PromptResult::Bool(false));
    }

    #[test]
    fn prompt_without_answer_errors() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Quiet, HashMap::new());
        let err = ui.prompt(&Prompt::input("name", "Name?")).unwrap_err();
        assert!(err.to_string().contains("PYPORT_PROMPT_NAME"));
    }

    #[test]
    fn confirm_rejects_non_boolean_answer() {
        let mut ui = ui_with("PYPORT_PROMPT_REPLACE", "perhaps");
        assert!(ui
            .prompt(&Prompt::confirm("replace", "Replace?", true))
            .is_err());
    }

    #[test]
    fn input_returns_string() {
        let mut ui = ui_with("PYPORT_PROMPT_NAME", "game");
        let result = ui.prompt(&Prompt::input("name", "Name?")).unwrap();
        assert_eq!(result, PromptResult::String("game".to_string()));
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
