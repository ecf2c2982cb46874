use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for the period, store, and model layers.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid document path: {0}")]
    InvalidPath(String),
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Document {path} cannot be read as expected: {reason}")]
    UnreadableDocument { path: String, reason: String },
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Developer hooks are disabled")]
    DevHooksDisabled,
}

pub type Result<T> = StdResult<T, FinanceError>;
