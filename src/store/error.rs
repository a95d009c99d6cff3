//! Store error taxonomy

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store
///
/// An unreadable daily file is not an error: it is logged and replaced by
/// an empty table on the next append.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Spreadsheet encoding failed: {0}")]
    Encode(#[from] rust_xlsxwriter::XlsxError),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid file name: {0}")]
    InvalidName(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Refusing to delete live daily file: {0}")]
    Refused(String),
    #[error("Store task failed: {0}")]
    Task(String),
}
