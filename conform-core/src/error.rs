//! Error type shared by every fallible operation in `conform-core`.
//!
//! Failures are terminal to the single operation that raised them. Callers in
//! the terminal front-end turn them into error notices and keep running.

/// Every way a review operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// A result, comment, user, run, or project id did not resolve.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// A required field was missing or malformed (inline form validation).
    #[error("{0}")]
    Validation(String),
    /// The session user lacks the role required for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// A report could not be produced in the requested format.
    #[error("export failed: {0}")]
    Export(String),
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ReviewError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
