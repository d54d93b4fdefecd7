//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/meetups/config.toml` by default. Every key is optional and
//! command-line flags take precedence.

use std::path::{Path, PathBuf};

use meetups_core::{FormatOptions, OutputFormat};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// Configuration for the meetups client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Where the initial list comes from.
    pub data: DataSettings,

    /// Display settings.
    pub display: DisplaySettings,
}

/// Data source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// JSON file holding the initial list of meetups.
    pub file: Option<PathBuf>,
}

/// Display settings for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Print JSON instead of text.
    pub json: bool,

    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,

    /// Text to show when there are no meetups.
    pub no_meetups_text: String,

    /// Prefix shown in front of favorites.
    pub favorite_marker: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            json: false,
            max_title_length: None,
            no_meetups_text: "No meetups".to_string(),
            favorite_marker: "*".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClientError::read(path, e))?;
        toml::from_str(&content)
            .map_err(|e| ClientError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetups")
    }

    /// Applies command-line overrides.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        self.debug |= cli.debug;
        if let Some(ref file) = cli.file {
            self.data.file = Some(file.clone());
        }
        self.display.json |= cli.json;
        if cli.max_title_length.is_some() {
            self.display.max_title_length = cli.max_title_length;
        }
        self
    }

    /// Returns the selected output format.
    pub fn output_format(&self) -> OutputFormat {
        if self.display.json {
            OutputFormat::Json
        } else {
            OutputFormat::Tty
        }
    }

    /// Returns the formatter options derived from the display settings.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            max_title_length: self.display.max_title_length,
            favorite_marker: self.display.favorite_marker.clone(),
            ..FormatOptions::default()
        }
    }
}
