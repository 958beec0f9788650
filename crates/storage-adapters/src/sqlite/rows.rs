//! Row shapes as read from SQLite, converted into domain models.

use chrono::{DateTime, Utc};
use domains::{Author, DomainError, Favorited, FileKind, Material, Tag, Visited};
use sqlx::FromRow;

/// Column list matching `MaterialRow`, for tables aliased as `m`.
pub(crate) const MATERIAL_COLUMNS: &str =
    "m.id, m.name, m.url, m.file_type, m.available, m.reviewed, m.created_by, m.created_at, m.updated_at";

pub(crate) const AUTHOR_COLUMNS: &str =
    "a.id, a.first_name, a.paternal_surname, a.maternal_surname, a.email, a.created_at, a.updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct MaterialRow {
    id: i64,
    name: String,
    url: String,
    file_type: String,
    available: bool,
    reviewed: bool,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MaterialRow> for Material {
    type Error = DomainError;

    fn try_from(row: MaterialRow) -> Result<Self, Self::Error> {
        let file_type = row.file_type.parse::<FileKind>().map_err(|_| {
            DomainError::internal(format!(
                "material {} has unknown file type '{}'",
                row.id, row.file_type
            ))
        })?;
        Ok(Material {
            id: row.id,
            name: row.name,
            url: row.url,
            file_type,
            available: row.available,
            reviewed: row.reviewed,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AuthorRow {
    id: i64,
    first_name: String,
    paternal_surname: String,
    maternal_surname: Option<String>,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: row.id,
            first_name: row.first_name,
            paternal_surname: row.paternal_surname,
            maternal_surname: row.maternal_surname,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct VisitedRow {
    #[sqlx(flatten)]
    material: MaterialRow,
    last_consulted: DateTime<Utc>,
}

impl TryFrom<VisitedRow> for Visited {
    type Error = DomainError;

    fn try_from(row: VisitedRow) -> Result<Self, Self::Error> {
        Ok(Visited {
            material: row.material.try_into()?,
            last_consulted: row.last_consulted,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct FavoritedRow {
    #[sqlx(flatten)]
    material: MaterialRow,
    added_at: DateTime<Utc>,
}

impl TryFrom<FavoritedRow> for Favorited {
    type Error = DomainError;

    fn try_from(row: FavoritedRow) -> Result<Self, Self::Error> {
        Ok(Favorited {
            material: row.material.try_into()?,
            added_at: row.added_at,
        })
    }
}

/// Converts every row, failing on the first one that does not map.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DomainError>
where
    T: TryFrom<R, Error = DomainError>,
{
    rows.into_iter().map(T::try_from).collect()
}
