use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{FavoriteEntry, MaterialId, UserId};
use serde::Serialize;

use super::UserMaterial;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteFlag {
    pub is_favorite: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<ApiResponse<Vec<FavoriteEntry>>>> {
    let entries = state.services.favorites.list(user_id).await?;
    Ok(Json(ApiResponse::data(entries)))
}

pub async fn add(
    State(state): State<AppState>,
    body: Result<Json<UserMaterial>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<()>>)> {
    let Json(body) = body?;
    state
        .services
        .favorites
        .add(body.user_id, body.material_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::message("added to favorites"))))
}

pub async fn check(
    State(state): State<AppState>,
    Path((user_id, material_id)): Path<(UserId, MaterialId)>,
) -> ApiResult<Json<ApiResponse<FavoriteFlag>>> {
    let is_favorite = state
        .services
        .favorites
        .is_favorite(user_id, material_id)
        .await?;
    Ok(Json(ApiResponse::data(FavoriteFlag { is_favorite })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, material_id)): Path<(UserId, MaterialId)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.favorites.remove(user_id, material_id).await?;
    Ok(Json(ApiResponse::message("removed from favorites")))
}
