//! # Visibility Policy
//!
//! Decides whether a material may be shown to a caller. Applied at every read
//! boundary: single get, by-author, by-tag, search, favorites and history.

use crate::role::Role;

/// Privileged roles see everything; everyone else only sees available materials.
pub fn is_visible(role: Role, available: bool) -> bool {
    role.is_privileged() || available
}

/// Whether queries issued on behalf of `role` must restrict to available rows.
pub fn requires_available(role: Role) -> bool {
    !role.is_privileged()
}
