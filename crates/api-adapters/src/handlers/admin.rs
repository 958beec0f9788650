//! Admin-only review endpoints. Every handler checks the caller's role first.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{Material, MaterialId};
use serde::Deserialize;

use super::{user_of, UserQuery};
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    #[serde(alias = "available")]
    pub disponible: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: i64,
}

pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Material>>>> {
    state.services.roles.require_admin(user_of(query)?).await?;
    let materials = state.services.catalog.list_for_review().await?;
    Ok(Json(ApiResponse::data(materials)))
}

pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
    query: Result<Query<UserQuery>, QueryRejection>,
    body: Result<Json<AvailabilityBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.roles.require_admin(user_of(query)?).await?;
    let Json(body) = body?;
    state
        .services
        .lifecycle
        .set_availability(id, body.disponible)
        .await?;
    Ok(Json(ApiResponse::message("availability updated")))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<MaterialId>,
    query: Result<Query<UserQuery>, QueryRejection>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.services.roles.require_admin(user_of(query)?).await?;
    let Json(body) = body?;
    state.services.lifecycle.set_status(id, body.status).await?;
    Ok(Json(ApiResponse::message("status updated")))
}
