//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::jobs::{JobEvent, JobEventKind};

use super::{
    prompt_user, InstallBoard, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt,
    PromptResult, PyportTheme, SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: PyportTheme,
    mode: OutputMode,
    board: Option<InstallBoard>,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stdout(),
            theme: PyportTheme::detect(),
            mode,
            board: None,
        }
    }

    fn board(&mut self) -> &mut InstallBoard {
        let theme = &self.theme;
        let mode = self.mode;
        self.board.get_or_insert_with(|| {
            if mode.shows_progress() {
                InstallBoard::new(theme.clone())
            } else {
                InstallBoard::hidden()
            }
        })
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        writeln!(self.term, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(Term::stderr(), "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_progress() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_output_line(&mut self, tag: &str, line: &str) {
        writeln!(self.term, "{}", self.theme.format_tagged(tag, line)).ok();
    }

    fn job_event(&mut self, event: &JobEvent) {
        if self.mode.shows_job_output() {
            if let JobEventKind::Progress(line) = &event.kind {
                let tagged = self.theme.format_tagged(&event.package, line.trim_end());
                if let Some(board) = &self.board {
                    board.println(&tagged);
                } else {
                    writeln!(self.term, "{}", tagged).ok();
                }
            }
        }
        self.board().apply(event);
        if event.is_completion() && self.board.as_ref().is_some_and(|b| b.running() == 0) {
            self.board = None;
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
