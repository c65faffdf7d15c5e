use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;

use hachijo_core::Envelope;
use hachijo_store::StoreError;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SaveReportRequest {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    payload: Option<Envelope>,
}

/// Upsert one report. The store decides which backend takes the write.
pub async fn save_report(
    State(state): State<AppState>,
    Json(body): Json<SaveReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = body.key.filter(|k| !k.is_empty());
    let endpoint = body.endpoint.filter(|e| !e.is_empty());
    let (Some(key), Some(endpoint), Some(payload)) = (key, endpoint, body.payload) else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "key, endpoint and payload are required",
        ));
    };

    let storage = state
        .store
        .upsert(&key, &endpoint, payload)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({ "ok": true, "storage": storage })))
}

/// Read reports by key. Keys come either comma-separated in `keys=` or as
/// repeated `key=` parameters; duplicates and blanks are dropped.
pub async fn read_reports(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut keys: Vec<String> = Vec::new();
    for (name, value) in params {
        match name.as_str() {
            "keys" => keys.extend(value.split(',').map(|k| k.trim().to_owned())),
            "key" => keys.push(value),
            _ => {}
        }
    }
    let mut seen = std::collections::HashSet::new();
    keys.retain(|k| !k.is_empty() && seen.insert(k.clone()));
    if keys.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "missing key parameter",
        ));
    }

    let records = state.store.read_many(&keys).await.map_err(store_error)?;
    Ok(Json(json!({ "ok": true, "records": records })))
}

fn store_error(err: StoreError) -> ApiError {
    let status = match err {
        StoreError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        StoreError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "report store operation failed");
    }
    ApiError::new(status, err.to_string())
}
