//! Reads the multipart form shared by material upload and update.

use axum::extract::Multipart;
use domains::{FileUpload, UserId};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default)]
pub(crate) struct MaterialForm {
    pub user_id: Option<UserId>,
    pub metadata: Option<String>,
    pub file: Option<FileUpload>,
    pub url: Option<String>,
}

pub(crate) async fn read_material_form(mut multipart: Multipart) -> ApiResult<MaterialForm> {
    let mut form = MaterialForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "userId" => {
                let raw = field.text().await?;
                form.user_id = parse_user_id(&raw)?;
            }
            "metadata" => form.metadata = Some(field.text().await?),
            "url" => form.url = Some(field.text().await?),
            "file" | "archivo" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                // Browsers send an empty, nameless part when no file was picked.
                if file_name.is_empty() && content.is_empty() {
                    continue;
                }
                form.file = Some(FileUpload { file_name, content });
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn parse_user_id(raw: &str) -> ApiResult<Option<UserId>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("userId '{raw}' is not a number")))
}
