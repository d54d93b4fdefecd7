//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

/// meetups - browse and edit a list of meetups
#[derive(Debug, Parser)]
#[command(name = "meetups")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETUPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file holding the initial list of meetups
    #[arg(long, short, env = "MEETUPS_FILE")]
    pub file: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Maximum title length (truncated with ellipsis)
    #[arg(long)]
    pub max_title_length: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
///
/// Every command except `config` prints the resulting list.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List meetups
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Add a meetup at the top of the list
    Add {
        /// Identifier of the new meetup
        #[arg(long)]
        id: String,

        /// Mark the new meetup as a favorite
        #[arg(long)]
        favorite: bool,

        /// Field as key=value (can be repeated); values parse as JSON when possible
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Merge fields onto an existing meetup
    Update {
        /// Identifier of the meetup to update
        id: String,

        /// Set the favorite flag
        #[arg(long)]
        favorite: Option<bool>,

        /// Field as key=value (can be repeated); values parse as JSON when possible
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Remove a meetup
    Remove {
        /// Identifier of the meetup to remove
        id: String,
    },

    /// Toggle the favorite flag of a meetup
    Favorite {
        /// Identifier of the meetup
        id: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

/// Parses `key=value`.
///
/// The value is read as JSON when it parses (`42`, `true`, `{"a":1}`) and as
/// a plain string otherwise.
pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid field `{}`: expected key=value", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid field `{}`: empty key", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
