//! The reporting envelope: the unit of exchange and storage.
//!
//! Every adapter run produces exactly one envelope, success or failure, so
//! all sources share one result contract. Construction goes through
//! [`Envelope::success`] / [`Envelope::failure`], which pin the shape of
//! both paths:
//!
//! - `ok=true` ⇒ no `error`.
//! - `ok=false` ⇒ `raw` is JSON null and `normalized` is absent.
//! - `sources` is always populated, so even a failed run says what was
//!   attempted.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::StatusCode;
use crate::transport::TransportItem;
use crate::weather::WeatherItem;

/// Citation metadata for one upstream source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
}

impl SourceRef {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A normalized record extracted from a raw source, discriminated by its
/// `service` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedItem {
    Transport(TransportItem),
    Weather(WeatherItem),
}

impl NormalizedItem {
    /// Status code carried by the item, if it has one. Weather items carry
    /// measurements, not statuses.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            NormalizedItem::Transport(item) => item.status,
            NormalizedItem::Weather(_) => None,
        }
    }
}

impl From<TransportItem> for NormalizedItem {
    fn from(item: TransportItem) -> Self {
        NormalizedItem::Transport(item)
    }
}

impl From<WeatherItem> for NormalizedItem {
    fn from(item: WeatherItem) -> Self {
        NormalizedItem::Weather(item)
    }
}

/// Error detail attached to a failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Success-path payload for [`Envelope::success`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopeParts {
    /// Untouched fetched payload (HTML/XML string or JSON value).
    pub raw: Value,
    /// Source-shaped intermediate extraction, kept for diagnostics.
    pub extracted: Option<Value>,
    /// Canonical output, in source document order.
    pub normalized: Vec<NormalizedItem>,
    /// Non-fatal extraction anomalies.
    pub warnings: Vec<String>,
}

/// The standard result wrapper for one fetch-and-normalize cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub ok: bool,
    pub fetched_at: String,
    pub sources: Vec<SourceRef>,
    pub raw: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<NormalizedItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

impl Envelope {
    /// Build a success envelope. `fetched_at` is stamped here, at the
    /// completion of the attempt. Warnings do not flip `ok`.
    #[must_use]
    pub fn success(sources: Vec<SourceRef>, parts: EnvelopeParts) -> Self {
        Self {
            ok: true,
            fetched_at: now_rfc3339(),
            sources,
            raw: parts.raw,
            extracted: parts.extracted,
            normalized: Some(parts.normalized),
            warnings: if parts.warnings.is_empty() {
                None
            } else {
                Some(parts.warnings)
            },
            error: None,
        }
    }

    /// Build a failure envelope: `raw` null, no normalized output, error set.
    #[must_use]
    pub fn failure(sources: Vec<SourceRef>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            fetched_at: now_rfc3339(),
            sources,
            raw: Value::Null,
            extracted: None,
            normalized: None,
            warnings: None,
            error: Some(EnvelopeError {
                message: message.into(),
                stack: None,
            }),
        }
    }

    /// Whether this envelope satisfies the success/failure shape contract.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        if self.ok {
            self.error.is_none()
        } else {
            self.raw.is_null()
                && self.normalized.as_ref().is_none_or(Vec::is_empty)
                && self.error.is_some()
        }
    }
}

/// Current UTC time as an RFC 3339 string with millisecond precision, the
/// format used for `fetchedAt` and `savedAt` throughout.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
