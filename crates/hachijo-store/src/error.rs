use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Report keys are path components in the fallback store, so only a
    /// conservative character set is accepted.
    #[error("invalid report key: {0:?}")]
    InvalidKey(String),

    /// The configured primary backend could not be reached or answered with
    /// an error on a read. Distinct from "no records found".
    #[error("report store unavailable: {context}")]
    Unavailable { context: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer from the primary backend's REST interface.
    #[error("store API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
