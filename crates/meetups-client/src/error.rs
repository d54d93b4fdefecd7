//! Client error types.

use std::io;
use std::path::PathBuf;

use meetups_core::StoreError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The meetups file is not a JSON array of meetups.
    #[error("invalid meetups file {}: {source}", .path.display())]
    InvalidMeetups {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Output could not be serialized.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
