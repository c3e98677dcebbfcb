//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use pyport::ui::{MockUI, Prompt, PromptResult, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("replace", "yes");
//!
//! ui.message("Scanning imports");
//! let answer = ui.prompt(&Prompt::confirm("replace", "Replace?", false)).unwrap();
//!
//! assert!(ui.has_message("Scanning"));
//! assert_eq!(answer, PromptResult::Bool(true));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{PyportError, Result};
use crate::jobs::JobEvent;

use super::{parse_bool, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
///
/// Supports both single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked repeatedly.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    output_lines: Vec<(String, String)>,
    spinners: Vec<String>,
    spinner_results: Arc<Mutex<Vec<String>>>,
    job_events: Vec<JobEvent>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue multiple responses for the same prompt key.
    ///
    /// Responses are returned in order. After the queue is exhausted,
    /// falls back to `set_prompt_response` or the prompt's default.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Tagged output lines as `(tag, line)`.
    pub fn output_lines(&self) -> &[(String, String)] {
        &self.output_lines
    }

    /// Messages of every spinner started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// How spinners finished, as `"success: msg"`, `"error: msg"` or
    /// `"skipped: msg"`.
    pub fn spinner_results(&self) -> Vec<String> {
        self.spinner_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every job event rendered, in order.
    pub fn job_events(&self) -> &[JobEvent] {
        &self.job_events
    }

    /// Keys of the prompts shown.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let queued = self
            .prompt_queues
            .get_mut(&prompt.key)
            .and_then(VecDeque::pop_front);
        let response = queued
            .or_else(|| self.prompt_responses.get(&prompt.key).cloned())
            .or_else(|| prompt.default.clone());

        let Some(response) = response else {
            return Err(PyportError::ConfigValidationError {
                message: format!("MockUI has no response for prompt '{}'", prompt.key),
            });
        };

        Ok(match prompt.prompt_type {
            PromptType::Confirm => PromptResult::Bool(parse_bool(&response).unwrap_or(false)),
            PromptType::Input => PromptResult::String(response),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Arc::clone(&self.spinner_results),
        })
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_output_line(&mut self, tag: &str, line: &str) {
        self.output_lines.push((tag.to_string(), line.to_string()));
    }

    fn job_event(&mut self, event: &JobEvent) {
        self.job_events.push(event.clone());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner that records how it finished in its `MockUI`.
#[derive(Debug)]
pub struct MockSpinner {
    results: Arc<Mutex<Vec<String>>>,
}

impl MockSpinner {
    fn record(&self, kind: &str, msg: &str) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{}: {}", kind, msg));
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.record("success", msg);
    }

    fn finish_error(&mut self, msg: &str) {
        self.record("error", msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.record("skipped", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobEventKind, JobId};

    #[test]
    fn captures_messages() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.success("done");
        ui.warning("careful");
        ui.error("broken");
        ui.show_header("Packages");

        assert!(ui.has_message("hello"));
        assert!(ui.has_success("done"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("broken"));
        assert_eq!(ui.headers(), ["Packages"]);
    }

    #[test]
    fn queued_responses_come_first() {
        let mut ui = MockUI::new();
        ui.queue_prompt_responses("pdb", vec!["n", "c"]);
        ui.set_prompt_response("pdb", "q");
        let prompt = Prompt::input("pdb", "(Pdb)");

        let answers: Vec<String> = (0..3)
            .map(|_| ui.prompt(&prompt).unwrap().as_string())
            .collect();
        assert_eq!(answers, ["n", "c", "q"]);
        assert_eq!(ui.prompts_shown().len(), 3);
    }

    #[test]
    fn missing_response_uses_default_or_errors() {
        let mut ui = MockUI::new();
        let confirm = Prompt::confirm("replace", "Replace?", true);
        assert_eq!(ui.prompt(&confirm).unwrap(), PromptResult::Bool(true));
        assert!(ui.prompt(&Prompt::input("name", "Name?")).is_err());
    }

    #[test]
    fn spinner_results_are_recorded() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Exporting");
        spinner.finish_success("Exported");
        let mut spinner = ui.start_spinner("Upgrading");
        spinner.finish_error("Upgrade failed");

        assert_eq!(ui.spinners(), ["Exporting", "Upgrading"]);
        assert_eq!(
            ui.spinner_results(),
            ["success: Exported", "error: Upgrade failed"]
        );
    }

    #[test]
    fn job_events_are_recorded() {
        let mut ui = MockUI::new();
        ui.job_event(&JobEvent {
            job: JobId(1),
            package: "numpy".to_string(),
            kind: JobEventKind::Progress("Collecting numpy".to_string()),
        });
        assert_eq!(ui.job_events().len(), 1);
        assert_eq!(ui.job_events()[0].package, "numpy");
    }
}
