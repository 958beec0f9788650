//! # Material lifecycle rules
//!
//! Two independent flags drive the review workflow: `available` (may
//! unprivileged users see it) and `reviewed` (has an admin checked it).
//! The initial pair is decided purely by the file type; afterwards any pair
//! is reachable through the explicit toggles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DomainError, Result};

/// Kind of content behind a material's locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Pdf,
    Zip,
    Link,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Zip => "ZIP",
            Self::Link => "LINK",
        }
    }

    /// Detects the kind of an uploaded file from its extension.
    /// Only `.pdf` and `.zip` are accepted (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    /// ZIP archives are held back until an admin reviews them.
    pub fn needs_review(self) -> bool {
        matches!(self, Self::Zip)
    }

    /// Whether the locator names a file in the file store.
    pub fn is_stored_file(self) -> bool {
        !matches!(self, Self::Link)
    }

    pub fn initial_state(self) -> ReviewState {
        if self.needs_review() {
            ReviewState::PENDING
        } else {
            ReviewState::PUBLISHED
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PDF" => Ok(Self::Pdf),
            "ZIP" => Ok(Self::Zip),
            "LINK" => Ok(Self::Link),
            other => Err(DomainError::validation(format!("unknown file type '{other}'"))),
        }
    }
}

/// The `(available, reviewed)` pair of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    pub available: bool,
    pub reviewed: bool,
}

impl ReviewState {
    /// Freshly uploaded ZIP, or a file replaced by a ZIP.
    pub const PENDING: Self = Self { available: false, reviewed: false };
    pub const PUBLISHED: Self = Self { available: true, reviewed: true };

    pub fn new(available: bool, reviewed: bool) -> Self {
        Self { available, reviewed }
    }
}

/// Parses a 0/1 toggle value. Anything else is rejected before storage is touched.
pub fn parse_flag(field: &str, value: i64) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DomainError::validation(format!(
            "{field} must be 0 or 1, got {other}"
        ))),
    }
}
