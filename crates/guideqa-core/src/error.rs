//! Error types for guideqa.

use crate::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuideqaError {
    #[error("History item not found: {0}")]
    HistoryNotFound(uuid::Uuid),

    #[error("Invalid evaluation case on line {line}: {message}")]
    InvalidCase { line: usize, message: String },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
