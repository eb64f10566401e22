//! Session error types

use std::path::PathBuf;
use thiserror::Error;

/// Login failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,
}

/// Errors maintaining session state
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Session I/O error at {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Session serialization error: {0}")]
    Serialization(String),

    #[error("Nothing selected to drill into")]
    NoSelection,
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    pub(crate) fn io(path: &std::path::Path, e: std::io::Error) -> Self {
        SessionError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
    }
}
