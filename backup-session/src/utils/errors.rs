//! Error types for the session layer.

use thiserror::Error;

use crate::tab::TabId;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("No work file selected")]
    NoFileSelected,

    #[error("No backups selected for restore")]
    NothingToRestore,

    #[error("Unknown tab: {0}")]
    UnknownTab(TabId),
}

impl SessionError {
    /// Errors that come from user input rather than the environment. These are
    /// shown as a blocking prompt and never change state.
    pub fn is_user_input(&self) -> bool {
        matches!(self, SessionError::NoFileSelected | SessionError::NothingToRestore)
    }

    /// Errors meaning a remembered path no longer resolves.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, SessionError::FileNotFound(_) | SessionError::NotAFile(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
