//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::shell::{OutputCallback, OutputLine};

use super::theme::PyportTheme;
use super::SpinnerHandle;

/// Longest line of live output shown under a spinner.
const MAX_LIVE_LINE: usize = 72;

pub(crate) fn spinner_style(indent: usize) -> ProgressStyle {
    let prefix = " ".repeat(indent);
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template(&format!("{}{{spinner:.magenta}} {{msg}}", prefix))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub(crate) fn finished_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// A progress spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
    indent: usize,
    theme: PyportTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        Self::with_indent(message, 0)
    }

    /// Create a new spinner with indentation.
    pub fn with_indent(message: &str, indent: usize) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style(indent));
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            indent,
            theme: PyportTheme::detect(),
        }
    }

    /// A spinner that never draws. Its final line is still printed, as
    /// that line is the result.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            indent: 0,
            theme: PyportTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        let line = format!("{}{}", " ".repeat(self.indent), line);
        if self.bar.is_hidden() {
            println!("{}", line);
        }
        self.bar.set_style(finished_style());
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish_with(line);
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        Some(self.bar.clone())
    }
}

/// Shorten `text` to at most [`MAX_LIVE_LINE`] characters.
pub(crate) fn truncate_line(text: &str) -> String {
    if text.chars().count() > MAX_LIVE_LINE {
        let head: String = text.chars().take(MAX_LIVE_LINE - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Create an output callback that updates a spinner with live output lines.
///
/// Keeps the last `max_lines` non-empty lines and shows them under
/// `base_message`, so a long pip or PyInstaller run visibly makes progress.
pub fn live_output_callback(
    bar: ProgressBar,
    base_message: String,
    indent: usize,
    max_lines: usize,
) -> OutputCallback {
    let buffer: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
    let theme = PyportTheme::detect();

    Box::new(move |line: OutputLine| {
        let text = match &line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.trim_end(),
        };
        if text.is_empty() {
            return;
        }

        let mut buf = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buf.push_back(truncate_line(text));
        while buf.len() > max_lines {
            buf.pop_front();
        }

        let prefix = " ".repeat(indent);
        let mut msg = base_message.clone();
        for line in buf.iter() {
            msg.push('\n');
            msg.push_str(&prefix);
            msg.push_str(&theme.dim.apply_to(format!("» {}", line)).to_string());
        }

        bar.set_message(msg);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_finishes() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.set_message("Updated");
        spinner.finish_success("Done");
        assert!(spinner.progress_bar().unwrap().is_finished());
    }

    #[test]
    fn finish_error_shows_cross() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_error("Failed");
        let msg = spinner.progress_bar().unwrap().message();
        assert!(msg.contains("✗ Failed"));
    }

    #[test]
    fn finish_skipped_shows_circle() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_skipped("Nothing to do");
        let msg = spinner.progress_bar().unwrap().message();
        assert!(msg.contains("○ Nothing to do"));
    }

    #[test]
    fn truncates_long_lines_by_chars() {
        assert_eq!(truncate_line("short"), "short");
        let long = "é".repeat(100);
        let cut = truncate_line(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_LIVE_LINE);
    }

    #[test]
    fn live_output_callback_keeps_last_lines() {
        let bar = ProgressBar::hidden();
        let callback = live_output_callback(bar.clone(), "Building...".to_string(), 4, 2);

        callback(OutputLine::Stdout("line 1".to_string()));
        assert!(bar.message().contains("Building..."));
        assert!(bar.message().contains("line 1"));

        callback(OutputLine::Stderr("line 2".to_string()));
        callback(OutputLine::Stdout("line 3".to_string()));
        let msg = bar.message();
        assert!(!msg.contains("line 1"));
        assert!(msg.contains("line 2"));
        assert!(msg.contains("line 3"));

        bar.finish();
    }

    #[test]
    fn live_output_callback_skips_empty_lines() {
        let bar = ProgressBar::hidden();
        let callback = live_output_callback(bar.clone(), "Running...".to_string(), 4, 2);

        callback(OutputLine::Stdout("".to_string()));
        callback(OutputLine::Stdout("real output".to_string()));
        let msg = bar.message();
        assert!(msg.contains("real output"));
        assert_eq!(msg.matches('\n').count(), 1);

        bar.finish();
    }
}
