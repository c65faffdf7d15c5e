//! Bounded-timeout HTTP fetchers.
//!
//! Every source adapter builds on this client: exactly one GET per call, a
//! fixed per-call deadline, non-2xx surfaced as a typed error, and no retry
//! anywhere — a single failed fetch is the adapter's failure.

mod error;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;

pub use error::FetchError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "hachijo-status/0.1";

/// A fetched text body with its HTTP status.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub body: String,
    pub status: u16,
}

/// A fetched, decoded JSON body with its HTTP status.
#[derive(Debug, Clone)]
pub struct FetchedJson<T> {
    pub data: T,
    pub status: u16,
}

/// HTTP client with a fixed deadline and user agent.
///
/// Cheap to clone; the inner `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Creates a client with the default 10 s deadline.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)
    }

    /// Creates a client with an explicit deadline and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn with_timeout(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Performs one GET and returns the body as text.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network failure or deadline expiry.
    /// - [`FetchError::UnexpectedStatus`] on a non-2xx response.
    pub async fn fetch_text(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<FetchedText, FetchError> {
        tracing::debug!(url = %url, "dispatching GET");
        let response = self
            .client
            .get(url)
            .headers(build_headers(headers))
            .send()
            .await?;
        let status = response.status();
        tracing::debug!(url = %url, status = %status, "response received");
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let body = response.text().await?;
        Ok(FetchedText {
            body,
            status: status.as_u16(),
        })
    }

    /// Performs one GET and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network failure or deadline expiry.
    /// - [`FetchError::UnexpectedStatus`] on a non-2xx response.
    /// - [`FetchError::Deserialize`] if the body is not valid `T`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<FetchedJson<T>, FetchError> {
        let fetched = self.fetch_text(url, headers).await?;
        let data =
            serde_json::from_str::<T>(&fetched.body).map_err(|e| FetchError::Deserialize {
                context: url.to_owned(),
                source: e,
            })?;
        Ok(FetchedJson {
            data,
            status: fetched.status,
        })
    }
}

fn build_headers(headers: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        // Silently skip malformed header pairs; callers pass literals.
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(*name),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}
