/// Error types for the meeting-minutes core
///
/// Uses thiserror for ergonomic error handling with proper Display implementations.
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription service error: {0}")]
    Transcription(String),

    /// Wraps whatever failed inside a merge; the in-progress transaction has
    /// already been rolled back when this surfaces.
    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[source] Box<AppError>),

    #[error("Remote delete failed: {0}")]
    RemoteDelete(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Wrap any error as a reconciliation failure.
    pub fn reconciliation(cause: AppError) -> Self {
        AppError::Reconciliation(Box::new(cause))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Convert AppError to a string for IPC-style callers
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}
