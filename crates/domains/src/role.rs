//! User roles as stored in the users table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles known to the repository.
///
/// Numeric codes match the users table: 1 = student, 2 = reviewer, 3 = admin.
/// Anything else, including an unknown user, is a `Guest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Student,
    Reviewer,
    Admin,
}

impl Role {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Student,
            2 => Self::Reviewer,
            3 => Self::Admin,
            _ => Self::Guest,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Guest => 0,
            Self::Student => 1,
            Self::Reviewer => 2,
            Self::Admin => 3,
        }
    }

    /// Privileged roles see materials regardless of their availability flag.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Reviewer | Self::Admin)
    }

    /// Only admins may toggle availability or review status.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Guest => "guest",
            Self::Student => "student",
            Self::Reviewer => "reviewer",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}
