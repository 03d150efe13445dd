use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the motorway monitor.
#[derive(Error, Debug)]
pub enum MotorwayError {
    /// The vehicle log feed could not be opened or read.
    #[error("Failed to read feed {path}: {source}")]
    FeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No feed file could be located.
    #[error("Feed not found: {0}")]
    FeedNotFound(PathBuf),

    /// A timestamp did not match `DD/MM/YYYY HH:MM`.
    #[error("Invalid timestamp \"{input}\": {reason}")]
    TimestampParse { input: String, reason: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MotorwayError {
    pub(crate) fn timestamp(input: &str, reason: impl Into<String>) -> Self {
        Self::TimestampParse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the motorway crates.
pub type Result<T> = std::result::Result<T, MotorwayError>;
