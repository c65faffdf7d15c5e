//! Keyed envelope persistence with a primary/fallback backend pair.
//!
//! The primary is a PostgREST endpoint (Supabase-style) addressed by URL
//! and API key; the fallback is a per-key JSON file directory. Writes go to
//! exactly one backend: primary when configured and healthy, files
//! otherwise. Reads use the primary whenever it is configured; a failing
//! configured primary is reported as unavailable rather than silently
//! served from stale files.

mod error;
mod fallback;
mod primary;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hachijo_core::{now_rfc3339, AppConfig, Envelope};

use fallback::FallbackStore;
use primary::{PrimaryStore, ReportRow};

pub use error::StoreError;

/// One persisted report, as written to the fallback files and returned by
/// reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub key: String,
    pub endpoint: String,
    pub payload: Envelope,
    pub saved_at: String,
}

/// Read result for one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRecord {
    pub payload: Envelope,
    pub saved_at: String,
}

/// Which backend actually served a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    Primary,
    Fallback,
}

/// Store connection settings, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub fallback_dir: PathBuf,
}

impl StoreConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
            table: config.reports_table.clone(),
            fallback_dir: config.fallback_dir.clone(),
        }
    }
}

/// The single persistence handle shared by the server and CLI.
#[derive(Debug, Clone)]
pub struct ReportStore {
    primary: Option<PrimaryStore>,
    fallback: FallbackStore,
}

impl ReportStore {
    /// Build a store; the primary is active only when both the URL and the
    /// API key are configured.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the primary's HTTP client cannot be
    /// constructed.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let primary = match (config.url, config.api_key) {
            (Some(url), Some(api_key)) => {
                Some(PrimaryStore::new(url, api_key, config.table)?)
            }
            _ => None,
        };
        Ok(Self {
            primary,
            fallback: FallbackStore::new(config.fallback_dir),
        })
    }

    /// Whether the primary backend is configured.
    #[must_use]
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Persist one envelope under `key`, stamping `savedAt` here.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] for keys outside `[A-Za-z0-9_-]`.
    /// - [`StoreError::Io`] / [`StoreError::Serialize`] when the fallback
    ///   write fails too.
    pub async fn upsert(
        &self,
        key: &str,
        endpoint: &str,
        payload: Envelope,
    ) -> Result<Storage, StoreError> {
        validate_key(key)?;
        let record = StoredRecord {
            key: key.to_owned(),
            endpoint: endpoint.to_owned(),
            payload,
            saved_at: now_rfc3339(),
        };

        if let Some(primary) = &self.primary {
            let row = ReportRow {
                key: record.key.clone(),
                endpoint: record.endpoint.clone(),
                payload: serde_json::to_value(&record.payload)?,
                saved_at: record.saved_at.clone(),
            };
            match primary.upsert(&row).await {
                Ok(()) => return Ok(Storage::Primary),
                Err(err) => {
                    tracing::warn!(key, error = %err, "primary upsert failed, using fallback");
                }
            }
        }

        self.fallback.write(&record).await?;
        Ok(Storage::Fallback)
    }

    /// Read the latest record for each key; missing keys are omitted.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] for keys outside `[A-Za-z0-9_-]`.
    /// - [`StoreError::Unavailable`] when the configured primary cannot be
    ///   read.
    pub async fn read_many(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, ReadRecord>, StoreError> {
        for key in keys {
            validate_key(key)?;
        }

        if let Some(primary) = &self.primary {
            let rows = primary
                .read_many(keys)
                .await
                .map_err(|err| StoreError::Unavailable {
                    context: err.to_string(),
                })?;
            let mut records = HashMap::new();
            for row in rows {
                match serde_json::from_value::<Envelope>(row.payload) {
                    Ok(payload) => {
                        records.insert(
                            row.key,
                            ReadRecord {
                                payload,
                                saved_at: row.saved_at,
                            },
                        );
                    }
                    Err(err) => {
                        tracing::warn!(key = %row.key, error = %err, "stored payload is not an envelope");
                    }
                }
            }
            return Ok(records);
        }

        let mut records = HashMap::new();
        for key in keys {
            if let Some(record) = self.fallback.read(key).await {
                records.insert(
                    key.clone(),
                    ReadRecord {
                        payload: record.payload,
                        saved_at: record.saved_at,
                    },
                );
            }
        }
        Ok(records)
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}
