use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{HistoryEntry, MaterialId, UserId};

use super::UserMaterial;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn record(
    State(state): State<AppState>,
    body: Result<Json<UserMaterial>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<()>>)> {
    let Json(body) = body?;
    state
        .services
        .history
        .record_view(body.user_id, body.material_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::message("history updated"))))
}

pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let entries = state.services.history.list(user_id).await?;
    Ok(Json(ApiResponse::data(entries)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, material_id)): Path<(UserId, MaterialId)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.history.remove(user_id, material_id).await?;
    Ok(Json(ApiResponse::message("history entry removed")))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<ApiResponse<u64>>> {
    let removed = state.services.history.clear(user_id).await?;
    Ok(Json(ApiResponse::data(removed).with_message("history cleared")))
}
