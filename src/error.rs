// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems. All of them are fatal and are raised before any
/// artifact is written or any email is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("{0} points to a non-existent path")]
    MissingPath(String),

    #[error("invalid lookback window: {0}")]
    InvalidLookback(String),

    #[error("conflicting options: {0}")]
    Conflict(String),

    #[error("nothing to do: {0}")]
    Empty(String),
}
