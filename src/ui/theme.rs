//! Visual theme and styling.

use console::Style;

/// pyport's visual theme.
#[derive(Debug, Clone)]
pub struct PyportTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for output-line tags such as package names (bold blue).
    pub tag: Style,
}

impl Default for PyportTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl PyportTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            tag: Style::new().bold().blue(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            tag: Style::new(),
        }
    }

    /// The colored theme when colors are enabled, otherwise plain.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a skipped message (icon + text in dim).
    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("○ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("◆"),
            self.highlight.apply_to(title)
        )
    }

    /// Format a line of child output as `[tag] line`.
    pub fn format_tagged(&self, tag: &str, line: &str) -> String {
        format!("{} {}", self.tag.apply_to(format!("[{}]", tag)), line)
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stdout is a TTY
    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_success() {
        let theme = PyportTheme::plain();
        let msg = theme.format_success("Complete");
        assert!(msg.contains("✓"));
        assert!(msg.contains("Complete"));
    }

    #[test]
    fn theme_formats_warning() {
        let theme = PyportTheme::plain();
        let msg = theme.format_warning("Caution");
        assert!(msg.contains("⚠"));
        assert!(msg.contains("Caution"));
    }

    #[test]
    fn theme_formats_error() {
        let theme = PyportTheme::plain();
        let msg = theme.format_error("Failed");
        assert!(msg.contains("✗"));
        assert!(msg.contains("Failed"));
    }

    #[test]
    fn theme_formats_skipped() {
        let theme = PyportTheme::plain();
        let msg = theme.format_skipped("Skipped");
        assert!(msg.contains("○"));
        assert!(msg.contains("Skipped"));
    }

    #[test]
    fn theme_formats_header() {
        let theme = PyportTheme::plain();
        assert_eq!(theme.format_header("Packages"), "◆ Packages");
    }

    #[test]
    fn plain_tagged_line() {
        let theme = PyportTheme::plain();
        assert_eq!(
            theme.format_tagged("requests", "Collecting requests"),
            "[requests] Collecting requests"
        );
    }

    #[test]
    fn default_impl_matches_new() {
        let default = PyportTheme::default();
        let new = PyportTheme::new();
        assert_eq!(default.format_success("test"), new.format_success("test"));
    }
}
