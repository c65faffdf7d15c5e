use thiserror::Error;

/// Errors from the bounded-timeout fetchers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, TLS, or deadline failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered outside the 2xx range.
    #[error("fetch failed with status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether this failure was a request deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}
