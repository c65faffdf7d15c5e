use thiserror::Error;

use hachijo_fetch::FetchError;

/// Internal adapter failures. Never escapes an adapter: `run()` converts
/// every variant into a failure envelope carrying the display message.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A required credential is absent. The message names the variable so
    /// the failure envelope explains exactly which configuration is missing.
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}
