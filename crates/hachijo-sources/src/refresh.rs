//! Batch refresh: run sources concurrently and persist every envelope.
//!
//! Failures are isolated per source. A failed fetch still persists its
//! failure envelope, so readers can tell "last run failed" apart from
//! "never ran".

use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;
use serde::Serialize;

use hachijo_core::Envelope;
use hachijo_store::ReportStore;

use crate::registry::{run_source, SourceContext, SourceKey};

/// Per-source result of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub fetch_ok: bool,
    pub save_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Refresh `keys` through the registered adapters.
pub async fn refresh_all(
    ctx: &SourceContext,
    store: &ReportStore,
    keys: &[SourceKey],
) -> HashMap<String, RefreshOutcome> {
    refresh_all_with(store, keys, |key| run_source(ctx, key)).await
}

/// Refresh with an injected runner; the seam the tests use to stand in
/// wiremock-backed adapters.
pub async fn refresh_all_with<F, Fut>(
    store: &ReportStore,
    keys: &[SourceKey],
    runner: F,
) -> HashMap<String, RefreshOutcome>
where
    F: Fn(SourceKey) -> Fut,
    Fut: Future<Output = Envelope>,
{
    let runs = keys.iter().map(|&key| {
        let runner = &runner;
        async move {
            let envelope = runner(key).await;
            let outcome = persist(store, key, envelope).await;
            (key.as_str().to_owned(), outcome)
        }
    });
    join_all(runs).await.into_iter().collect()
}

async fn persist(store: &ReportStore, key: SourceKey, envelope: Envelope) -> RefreshOutcome {
    let fetch_ok = envelope.ok;
    let fetched_at = Some(envelope.fetched_at.clone());
    let error = envelope.error.as_ref().map(|e| e.message.clone());

    let save_ok = match store.upsert(key.as_str(), &key.endpoint(), envelope).await {
        Ok(storage) => {
            tracing::debug!(key = %key, ?storage, "report saved");
            true
        }
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "report save failed");
            false
        }
    };

    RefreshOutcome {
        fetch_ok,
        save_ok,
        fetched_at,
        error,
    }
}
