//! Error types for VeilKV
//!
//! Provides a unified error type for all operations, and the single place
//! where engine statuses are turned into errors.

use thiserror::Error;

use crate::backend::Status;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for VeilKV operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Database corrupted: {0}")]
    Corruption(String),

    #[error("Database I/O error: {0}")]
    Io(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Undecodable record: {0}")]
    Undecodable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Setup Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(#[from] std::io::Error),
}

impl StoreError {
    /// True for failures reported by the underlying engine.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            StoreError::Corruption(_)
                | StoreError::Io(_)
                | StoreError::InvalidArgument(_)
                | StoreError::NotSupported(_)
        )
    }
}

/// Convert a non-ok engine status into a `StoreError`.
///
/// Every status passing through here is logged with the engine's message.
/// `NotFound` is expected to be intercepted by callers that treat absence as
/// a normal outcome; reaching this function means the entry was required.
pub fn handle_status(op: &str, status: Status) -> StoreError {
    tracing::error!(op, status = %status, "database {} failure", op);

    match status {
        Status::NotFound => StoreError::InvalidArgument("database entry missing".to_string()),
        Status::Corruption(msg) => StoreError::Corruption(msg),
        Status::IoError(msg) => StoreError::Io(msg),
        Status::InvalidArgument(msg) => StoreError::InvalidArgument(msg),
        Status::NotSupported(msg) => StoreError::NotSupported(msg),
    }
}
