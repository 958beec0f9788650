//! Route handlers, grouped by resource.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use domains::{MaterialId, UserId};
use serde::Deserialize;

use crate::error::ApiResult;

pub mod admin;
pub mod authors;
pub mod favorites;
pub mod history;
pub mod materials;
pub mod system;
pub mod tags;

/// `?userId=` carried by most read endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<UserId>,
}

/// Body of the endpoints that pair a user with a material.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMaterial {
    pub user_id: UserId,
    pub material_id: MaterialId,
}

pub(crate) fn user_of(query: Result<Query<UserQuery>, QueryRejection>) -> ApiResult<Option<UserId>> {
    let Query(query) = query?;
    Ok(query.user_id)
}
