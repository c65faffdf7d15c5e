//! Per-key JSON file fallback store.
//!
//! Used when the primary backend is unconfigured or a write to it fails.
//! One file per key under the fallback directory; writes go through a
//! temporary file and rename so readers never see a half-written record.

use std::path::PathBuf;

use tokio::fs;

use crate::error::StoreError;
use crate::StoredRecord;

#[derive(Debug, Clone)]
pub(crate) struct FallbackStore {
    dir: PathBuf,
}

impl FallbackStore {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub(crate) async fn write(&self, record: &StoredRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(record)?;
        let path = self.record_path(&record.key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read one record; a missing or unreadable file is `None`.
    pub(crate) async fn read(&self, key: &str) -> Option<StoredRecord> {
        let path = self.record_path(key);
        let body = match fs::read(&path).await {
            Ok(body) => body,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "fallback read failed");
                return None;
            }
        };
        match serde_json::from_slice(&body) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "fallback record is corrupt");
                None
            }
        }
    }
}
