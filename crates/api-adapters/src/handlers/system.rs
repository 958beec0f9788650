use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "status": "up" }))
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.render().map_err(|e| {
        tracing::error!(error = %e, "failed to encode metrics");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    })?;
    Ok(([(header::CONTENT_TYPE, OPENMETRICS)], body))
}
