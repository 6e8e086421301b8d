//! Console output for the command-line front end.
//!
//! Colors are used only when stdout is a terminal and `NO_COLOR` is unset.
//! Diagnostics go through `tracing`; this module is for the results a user
//! asked for.

use crate::model::{ChapterRange, ChapterRef, SeriesStatus, format_number};
use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::Gray => "90",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Width of the label column in [`Console::field`].
const FIELD_WIDTH: usize = 12;

#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();
        Self { colors_enabled }
    }

    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// A bracketed label such as `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        format!("[{}]", self.style(label, &[color, Style::Bold]))
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    pub fn step(&self, message: &str) {
        println!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    pub fn muted(&self, text: &str) -> String {
        self.style(text, &[Style::Gray, Style::Dim])
    }

    /// Prints an aligned `label: value` line; blank values are skipped.
    pub fn field(&self, label: &str, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        let padded = format!("{:<width$}", format!("{}:", label), width = FIELD_WIDTH);
        println!("  {} {}", self.style(&padded, &[Style::Bold]), value);
    }

    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats a chapter range as `1-10`, or `none` for the empty default.
    pub fn range(&self, range: &ChapterRange, total: usize) -> String {
        if total == 0 {
            return self.muted("none");
        }
        self.style(
            &format!("{}-{}", format_number(range.min), format_number(range.max)),
            &[Style::Cyan, Style::Bold],
        )
    }

    pub fn status(&self, status: SeriesStatus) -> String {
        match status {
            SeriesStatus::Ongoing => self.style("Ongoing", &[Style::Yellow]),
            SeriesStatus::Completed => self.style("Completed", &[Style::Green]),
        }
    }

    /// One line of a chapter listing.
    pub fn chapter_line(&self, chapter: &ChapterRef) -> String {
        let number = self.style(&format!("{:>7}", format_number(chapter.number)), &[Style::Bold]);
        let mut line = format!("{}  {}  {}", number, chapter.title, self.muted(&chapter.content_url));
        if chapter.inferred {
            line.push_str(&format!(" {}", self.style("(position)", &[Style::Yellow])));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_multiple_styles() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.contains("1;31"));
        assert!(styled.ends_with(RESET));
    }

    #[test]
    fn test_label() {
        let console = Console::with_colors(false);
        assert_eq!(console.label("INFO", Style::Blue), "[INFO]");
    }

    #[test]
    fn test_range() {
        let console = Console::with_colors(false);
        assert_eq!(console.range(&ChapterRange { min: 1.0, max: 12.5 }, 13), "1-12.5");
        assert_eq!(console.range(&ChapterRange::DEGENERATE, 0), "none");
    }

    #[test]
    fn test_chapter_line_marks_inferred() {
        let console = Console::with_colors(false);
        let chapter = ChapterRef {
            number: 3.0,
            title: "Side Story".to_string(),
            content_url: "https://site.com/read/side".to_string(),
            released_at: Utc::now(),
            inferred: true,
        };
        let line = console.chapter_line(&chapter);
        assert!(line.starts_with("      3  Side Story"));
        assert!(line.ends_with("(position)"));
    }
}
