use seoforge_core::SeoforgeError;

use crate::window::Window;

/// Rejection signal returned when any applicable limit is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded for {scope} ({limit}/{window}), retry after {retry_after_seconds}s")]
pub struct RateLimited {
    /// Remaining seconds in the exceeded window.
    pub retry_after_seconds: u64,
    pub window: Window,
    pub limit: u32,
    pub scope: String,
}

impl From<RateLimited> for SeoforgeError {
    fn from(e: RateLimited) -> Self {
        SeoforgeError::RateLimited {
            retry_after_seconds: e.retry_after_seconds,
        }
    }
}
