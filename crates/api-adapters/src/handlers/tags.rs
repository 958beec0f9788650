use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Tag, TagId};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TagBody {
    #[serde(alias = "nombre")]
    pub name: String,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Tag>>>> {
    Ok(Json(ApiResponse::data(state.services.tags.list().await?)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    Ok(Json(ApiResponse::data(state.services.tags.get(id).await?)))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<TagBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Tag>>)> {
    let Json(body) = body?;
    let tag = state.services.tags.create(&body.name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(tag))))
}

pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    body: Result<Json<TagBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Tag>>> {
    let Json(body) = body?;
    let tag = state.services.tags.rename(id, &body.name).await?;
    Ok(Json(ApiResponse::data(tag)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.tags.delete(id).await?;
    Ok(Json(ApiResponse::message("tag deleted")))
}
