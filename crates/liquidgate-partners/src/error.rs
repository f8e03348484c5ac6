//! Credential source errors.

use std::path::PathBuf;

/// Failure to load partner credentials.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The credentials file could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The payload was not a recognised credential document.
    #[error("invalid credential payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The partner-profile service could not be reached.
    #[error("partner profile request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The partner-profile service answered with a non-success status.
    #[error("partner profile service returned HTTP {0}")]
    Status(u16),

    /// A reload produced no usable credentials.
    #[error("credential source returned no usable credentials")]
    Empty,
}
