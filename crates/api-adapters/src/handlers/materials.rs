use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use domains::{DomainError, Material, MaterialDetail, MaterialId, TagId, UserId};
use serde::{Deserialize, Serialize};
use services::{SearchQuery, UpdateRequest, UploadRequest};

use super::{user_of, UserQuery};
use crate::error::ApiResult;
use crate::multipart::read_material_form;
use crate::response::ApiResponse;
use crate::state::AppState;

type Envelope<T> = Json<ApiResponse<T>>;

/// Query string of `GET /materiales/buscar`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub user_id: Option<UserId>,
    pub material_nombre: Option<String>,
    pub autor_nombre: Option<String>,
    /// Comma-separated tag ids, e.g. `1,2`.
    pub tags: Option<String>,
}

impl SearchParams {
    fn tag_ids(&self) -> Result<Vec<TagId>, DomainError> {
        let Some(raw) = self.tags.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse()
                    .map_err(|_| DomainError::validation(format!("tag id '{part}' is not a number")))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCount {
    pub material_id: MaterialId,
    pub favorites: i64,
}

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<Material>>> {
    let materials = state.services.catalog.list_materials(user_of(query)?).await?;
    Ok(Json(ApiResponse::data(materials)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Envelope<MaterialDetail>> {
    let detail = state.services.catalog.get_material(id, user_of(query)?).await?;
    Ok(Json(ApiResponse::data(detail)))
}

/// Serves the stored PDF/ZIP as an attachment.
pub async fn file(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let file = state.services.catalog.material_file(id, user_of(query)?).await?;
    let content_type: mime::Mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ascii_file_name(&file.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    ))
}

pub async fn by_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<MaterialDetail>>> {
    let materials = state
        .services
        .catalog
        .materials_by_author(author_id, user_of(query)?)
        .await?;
    Ok(Json(ApiResponse::data(materials)))
}

pub async fn by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<TagId>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<MaterialDetail>>> {
    let materials = state
        .services
        .catalog
        .materials_by_tag(tag_id, user_of(query)?)
        .await?;
    Ok(Json(ApiResponse::data(materials)))
}

pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<MaterialDetail>>> {
    let Query(params) = params?;
    let query = SearchQuery {
        tag_ids: params.tag_ids()?,
        material_name: params.material_nombre,
        author_name: params.autor_nombre,
    };
    let materials = state.services.catalog.search(query, params.user_id).await?;
    state.metrics.search();
    Ok(Json(ApiResponse::data(materials)))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Envelope<MaterialDetail>)> {
    let form = read_material_form(multipart).await?;
    let request = UploadRequest {
        user_id: form.user_id,
        metadata: form.metadata.unwrap_or_default(),
        file: form.file,
        url: form.url,
    };
    let detail = state.services.lifecycle.upload(request).await?;
    state.metrics.upload(detail.material.file_type.as_str());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(detail).with_message("material uploaded")),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
    multipart: Multipart,
) -> ApiResult<Envelope<MaterialDetail>> {
    let form = read_material_form(multipart).await?;
    let request = UpdateRequest {
        metadata: form.metadata,
        file: form.file,
        url: form.url,
    };
    let detail = state.services.lifecycle.update(id, request).await?;
    Ok(Json(ApiResponse::data(detail).with_message("material updated")))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
) -> ApiResult<Envelope<()>> {
    state.services.lifecycle.delete(id).await?;
    Ok(Json(ApiResponse::message("material deleted")))
}

pub async fn favorite_count(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
) -> ApiResult<Envelope<FavoriteCount>> {
    let favorites = state.services.favorites.count(id).await?;
    Ok(Json(ApiResponse::data(FavoriteCount {
        material_id: id,
        favorites,
    })))
}

fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
