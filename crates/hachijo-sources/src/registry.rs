//! Source registry: stable keys, endpoints, and adapter dispatch.

use serde::{Deserialize, Serialize};

use hachijo_core::{AppConfig, Envelope};
use hachijo_fetch::{FetchClient, FetchError};

use crate::ana::AnaSource;
use crate::business_hours::BusinessHoursSource;
use crate::tokaikisen::TokaikisenSource;
use crate::typhoon::TyphoonSource;
use crate::umisora::UmisoraSource;
use crate::wave::WaveSource;
use crate::wind::WindSource;

/// Every known source, identified by the key used in URLs and the report
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKey {
    #[serde(rename = "tokaikisen")]
    Tokaikisen,
    #[serde(rename = "umisora")]
    Umisora,
    #[serde(rename = "ana")]
    Ana,
    #[serde(rename = "wave")]
    Wave,
    #[serde(rename = "wind")]
    Wind,
    #[serde(rename = "typhoon")]
    Typhoon,
    #[serde(rename = "business-hours")]
    BusinessHours,
}

impl SourceKey {
    pub const ALL: [SourceKey; 7] = [
        SourceKey::Tokaikisen,
        SourceKey::Umisora,
        SourceKey::Ana,
        SourceKey::Wave,
        SourceKey::Wind,
        SourceKey::Typhoon,
        SourceKey::BusinessHours,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKey::Tokaikisen => "tokaikisen",
            SourceKey::Umisora => "umisora",
            SourceKey::Ana => "ana",
            SourceKey::Wave => "wave",
            SourceKey::Wind => "wind",
            SourceKey::Typhoon => "typhoon",
            SourceKey::BusinessHours => "business-hours",
        }
    }

    /// API route serving this source's envelope.
    #[must_use]
    pub fn endpoint(self) -> String {
        format!("/api/fetch/{}", self.as_str())
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }

    /// Whether this source needs a credential before it can run.
    #[must_use]
    pub fn requires_credential(self) -> bool {
        matches!(self, SourceKey::Ana | SourceKey::BusinessHours)
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared adapter inputs: one HTTP client plus the optional credentials.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub client: FetchClient,
    pub odpt_consumer_key: Option<String>,
    pub google_maps_api_key: Option<String>,
}

impl SourceContext {
    /// Build from application configuration, including the fetch deadline
    /// and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: FetchClient::with_timeout(config.fetch_timeout_secs, &config.user_agent)?,
            odpt_consumer_key: config.odpt_consumer_key.clone(),
            google_maps_api_key: config.google_maps_api_key.clone(),
        })
    }

    #[must_use]
    pub fn new(client: FetchClient) -> Self {
        Self {
            client,
            odpt_consumer_key: None,
            google_maps_api_key: None,
        }
    }
}

/// Run one source end to end. Never fails: adapter errors come back as
/// failure envelopes.
pub async fn run_source(ctx: &SourceContext, key: SourceKey) -> Envelope {
    let client = ctx.client.clone();
    match key {
        SourceKey::Tokaikisen => TokaikisenSource::new(client).run().await,
        SourceKey::Umisora => UmisoraSource::new(client).run().await,
        SourceKey::Ana => {
            AnaSource::new(client, ctx.odpt_consumer_key.clone())
                .run()
                .await
        }
        SourceKey::Wave => WaveSource::new(client).run().await,
        SourceKey::Wind => WindSource::new(client).run().await,
        SourceKey::Typhoon => TyphoonSource::new(client).run().await,
        SourceKey::BusinessHours => {
            BusinessHoursSource::new(client, ctx.google_maps_api_key.clone())
                .run()
                .await
        }
    }
}

/// Default batch-refresh set: every keyless source, plus each keyed source
/// whose credential is configured.
#[must_use]
pub fn default_refresh_keys(ctx: &SourceContext) -> Vec<SourceKey> {
    SourceKey::ALL
        .into_iter()
        .filter(|key| match key {
            SourceKey::Ana => ctx.odpt_consumer_key.is_some(),
            SourceKey::BusinessHours => ctx.google_maps_api_key.is_some(),
            _ => true,
        })
        .collect()
}
