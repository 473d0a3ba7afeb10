use thiserror::Error;

/// Failures at the completion service boundary.
///
/// The split drives the retry policy: `RateLimited` and `Transient` are
/// retried with backoff, `Permanent` is surfaced immediately because it
/// would recur on every subsequent frame.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rate limited by completion service: {0}")]
    RateLimited(String),

    #[error("transient service failure: {0}")]
    Transient(String),

    #[error("permanent service failure: {0}")]
    Permanent(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::RateLimited(_) | ServiceError::Transient(_))
    }
}

/// Failures in the frame record store. Fatal at pipeline level.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}
