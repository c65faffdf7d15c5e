//! PostgREST-backed primary report store (Supabase-style).
//!
//! One table keyed by report key; writes are whole-row upserts resolved by
//! `on_conflict=key`, so a refresh cycle is idempotent per key.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Row shape of the reports table. Column names are snake_case on the
/// backend, unlike the camelCase wire records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ReportRow {
    pub key: String,
    pub endpoint: String,
    pub payload: Value,
    pub saved_at: String,
}

#[derive(Debug, Clone)]
pub(crate) struct PrimaryStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl PrimaryStore {
    pub(crate) fn new(base_url: String, api_key: String, table: String) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            table,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    pub(crate) async fn upsert(&self, row: &ReportRow) -> Result<(), StoreError> {
        let url = format!("{}?on_conflict=key", self.table_url());
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[row])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    pub(crate) async fn read_many(&self, keys: &[String]) -> Result<Vec<ReportRow>, StoreError> {
        let filter = format!("in.({})", keys.join(","));
        let url = format!(
            "{}?select=key,endpoint,payload,saved_at&key={}",
            self.table_url(),
            filter
        );
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
