use thiserror::Error;

/// Caller-facing error taxonomy shared by every crate in the workspace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeoforgeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl SeoforgeError {
    /// Fatal errors force a record into `failed`; everything else degrades.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SeoforgeError::Storage(_) | SeoforgeError::Invariant(_))
    }
}
