use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{Author, AuthorDraft, AuthorId, AuthorPatch, UserId};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

type AuthorResponse = Json<ApiResponse<Author>>;

/// Body of `POST /autores/relacion`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationBody {
    pub user_id: UserId,
    #[serde(alias = "autorId")]
    pub author_id: AuthorId,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Author>>>> {
    Ok(Json(ApiResponse::data(state.services.authors.list().await?)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<AuthorId>,
) -> ApiResult<AuthorResponse> {
    Ok(Json(ApiResponse::data(state.services.authors.get(id).await?)))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<AuthorDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, AuthorResponse)> {
    let Json(draft) = body?;
    let author = state.services.authors.create(draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(author))))
}

pub async fn find_or_create(
    State(state): State<AppState>,
    body: Result<Json<AuthorDraft>, JsonRejection>,
) -> ApiResult<AuthorResponse> {
    let Json(draft) = body?;
    let author = state.services.authors.find_or_create(draft).await?;
    Ok(Json(ApiResponse::data(author)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<AuthorId>,
    body: Result<Json<AuthorPatch>, JsonRejection>,
) -> ApiResult<AuthorResponse> {
    let Json(patch) = body?;
    let author = state.services.authors.update(id, patch).await?;
    Ok(Json(ApiResponse::data(author)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<AuthorId>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.authors.delete(id).await?;
    Ok(Json(ApiResponse::message("author deleted")))
}

pub async fn link_user(
    State(state): State<AppState>,
    body: Result<Json<RelationBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<()>>)> {
    let Json(body) = body?;
    state
        .services
        .authors
        .link_user(body.user_id, body.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::message("relation created"))))
}

pub async fn author_of_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ApiResult<AuthorResponse> {
    let author = state.services.authors.author_of_user(user_id).await?;
    Ok(Json(ApiResponse::data(author)))
}

pub async fn unlink_user(
    State(state): State<AppState>,
    Path((user_id, author_id)): Path<(UserId, AuthorId)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.authors.unlink_user(user_id, author_id).await?;
    Ok(Json(ApiResponse::message("relation removed")))
}
