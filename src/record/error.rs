//! Record ingestion error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a payload into records
#[derive(Error, Debug)]
pub enum RecordError {
    /// Payload was not valid JSON even after sanitizing
    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A local dump could not be read
    #[error("Failed to read {path:?}: {error}")]
    Io { path: PathBuf, error: String },
}

/// Result type alias for record ingestion
pub type RecordResult<T> = Result<T, RecordError>;
