use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use hachijo_sources::{run_source, SourceKey};

use super::{ApiError, AppState};
use crate::middleware::RequestId;

/// Run one adapter and return its envelope. Failure envelopes are still
/// HTTP 200; only an unknown source key is an HTTP error.
pub async fn fetch_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(source): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = SourceKey::parse(&source).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            format!("unknown source: {source}"),
        )
    })?;
    tracing::info!(request_id = %req_id.0, source = %key, "running source fetch");
    let envelope = run_source(&state.ctx, key).await;
    Ok(Json(envelope))
}
