//! # Role Resolver
//!
//! Maps an optional user id to a `Role`. Unknown users and unrecognized codes
//! resolve to `Role::Guest`, which is never privileged.

use std::sync::Arc;

use domains::{DomainError, Result, Role, UserId, UserRoleStore};

#[derive(Clone)]
pub struct RoleResolver {
    users: Arc<dyn UserRoleStore>,
}

impl RoleResolver {
    pub fn new(users: Arc<dyn UserRoleStore>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, user_id: Option<UserId>) -> Result<Role> {
        let Some(user_id) = user_id else {
            return Ok(Role::Guest);
        };
        let role = self
            .users
            .role_of(user_id)
            .await?
            .map(Role::from_code)
            .unwrap_or_default();
        tracing::debug!(user_id, %role, "resolved role");
        Ok(role)
    }

    /// Admin-only operations call this before touching anything.
    pub async fn require_admin(&self, user_id: Option<UserId>) -> Result<Role> {
        let role = self.resolve(user_id).await?;
        if role.is_admin() {
            Ok(role)
        } else {
            tracing::warn!(?user_id, %role, "admin operation refused");
            Err(DomainError::Unauthorized(
                "operation requires an administrator".to_string(),
            ))
        }
    }
}
