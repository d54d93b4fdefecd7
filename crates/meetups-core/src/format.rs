//! Output formatting for meetup lists.
//!
//! Two outputs are supported:
//! - **TTY**: one human-readable line per meetup, favorites marked
//! - **JSON**: the records themselves plus a few counters
//!
//! # Example
//!
//! ```rust
//! use meetups_core::format::OutputFormatter;
//! use meetups_core::Meetup;
//!
//! let meetups = vec![Meetup::new("m1").with_field("title", "Swim Together")];
//! let lines = OutputFormatter::with_defaults().format_tty(&meetups);
//! assert_eq!(lines, vec!["  Swim Together [m1]".to_string()]);
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::meetup::Meetup;

/// The output format for meetup display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Tty,
    /// Machine-readable JSON output.
    Json,
}

/// Configuration options for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Maximum length for titles (truncated with ellipsis).
    pub max_title_length: Option<usize>,
    /// Prefix shown in front of favorites.
    pub favorite_marker: String,
    /// Title shown for meetups without one.
    pub untitled_text: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_title_length: None,
            favorite_marker: "*".to_string(),
            untitled_text: "(untitled)".to_string(),
        }
    }
}

/// JSON output format for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Number of meetups returned.
    pub count: usize,
    /// Number of favorites among them.
    pub favorite_count: usize,
    /// The meetups, in collection order.
    pub meetups: Vec<Meetup>,
}

/// Output formatter for meetup lists.
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    options: FormatOptions,
}

impl OutputFormatter {
    /// Creates a new OutputFormatter with the given options.
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Creates a new OutputFormatter with default options.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Formats meetups for TTY output, one line each.
    pub fn format_tty(&self, meetups: &[Meetup]) -> Vec<String> {
        meetups.iter().map(|m| self.format_line(m)).collect()
    }

    /// Formats meetups as JSON output.
    pub fn format_json(&self, meetups: &[Meetup]) -> JsonOutput {
        JsonOutput {
            count: meetups.len(),
            favorite_count: meetups.iter().filter(|m| m.is_favorite).count(),
            meetups: meetups.to_vec(),
        }
    }

    /// Formats a single meetup.
    ///
    /// `<marker> <title>[ @ <location>] [<id>]`, where non-favorites get
    /// blank padding the width of the marker so titles line up.
    pub fn format_line(&self, meetup: &Meetup) -> String {
        let marker: Cow<'_, str> = if meetup.is_favorite {
            Cow::Borrowed(self.options.favorite_marker.as_str())
        } else {
            Cow::Owned(" ".repeat(self.options.favorite_marker.chars().count()))
        };

        let title = meetup.title().unwrap_or(self.options.untitled_text.as_str());
        let title = match self.options.max_title_length {
            Some(max) => ellipsis(title, max),
            None => Cow::Borrowed(title),
        };

        let mut line = format!("{} {}", marker, title);
        if let Some(location) = meetup.location() {
            line.push_str(" @ ");
            line.push_str(location);
        }
        line.push_str(&format!(" [{}]", meetup.id));
        line
    }
}

/// Truncates a string to a maximum length, adding ellipsis if needed.
///
/// Returns the original string if it's within the limit.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}
