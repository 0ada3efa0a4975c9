//! Storage error types.
//!
//! These error types represent failures when talking to the backing store.
//! Defined in `exportmeter-core` so the submission engine can downcast and
//! classify errors for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key or token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("storage API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl StoreError {
    /// Returns `true` if this error is permanent and should not be retried.
    ///
    /// Client-side errors (auth, 4xx other than 429) will not resolve on
    /// their own; rate limits, timeouts, network failures, and 5xx might.
    pub fn is_permanent(&self) -> bool {
        match self {
            StoreError::AuthenticationFailed(_) => true,
            StoreError::ApiError { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            StoreError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
