use std::time::Instant;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::json;

use hachijo_sources::{default_refresh_keys, refresh_all};

use super::AppState;

/// Refresh every configured source and persist the envelopes. Individual
/// source failures land in `results`, not in the HTTP status.
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let keys = default_refresh_keys(&state.ctx);
    let results = refresh_all(&state.ctx, &state.store, &keys).await;
    let took_ms = started.elapsed().as_millis();
    Json(json!({ "ok": true, "results": results, "tookMs": took_ms }))
}
