use thiserror::Error;

/// Batch-level failures. Raised before any request is dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl FetchError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FetchError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Per-request failures. These never escape the executor; they end up as the
/// `error` text of a failed [`ResultRecord`](crate::ResultRecord).
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Proxy configuration error: {0}")]
    Proxy(String),

    #[error("Request timeout after {0} ms")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Failed to parse JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestFailure {
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestFailure::Timeout(_) => true,
            RequestFailure::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
