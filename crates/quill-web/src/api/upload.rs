use std::path::Path;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;

use crate::dto::{succ, Reply, UploadResponse};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Image,
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Reply<UploadResponse>>, AppError> {
    store_upload(&state, multipart, Kind::File).await
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Reply<UploadResponse>>, AppError> {
    store_upload(&state, multipart, Kind::Image).await
}

/// Lowercased alphanumeric extension of `name`, if it has a usable one.
fn clean_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

async fn store_upload(
    state: &AppState,
    mut multipart: Multipart,
    kind: Kind,
) -> Result<Json<Reply<UploadResponse>>, AppError> {
    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| AppError::fail_with("upload failed", e.body_text()))?
        {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(AppError::fail("no file field in upload")),
        }
    };

    let original = field.file_name().unwrap_or_default().to_string();
    if kind == Kind::Image {
        let is_image = mime_guess::from_path(&original)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
        if !is_image {
            return Err(AppError::fail("only image files may be uploaded here"));
        }
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::fail_with("upload failed", e.body_text()))?;
    if data.is_empty() {
        return Err(AppError::fail("uploaded file is empty"));
    }
    let limit = state.config.upload.max_size_mb * 1024 * 1024;
    if data.len() > limit {
        return Err(AppError::fail(format!(
            "file exceeds {} MB",
            state.config.upload.max_size_mb
        )));
    }

    let month = Utc::now().format("%Y%m").to_string();
    let mut name = uuid::Uuid::new_v4().simple().to_string();
    if let Some(ext) = clean_extension(&original) {
        name = format!("{name}.{ext}");
    }

    let dir = state.config.upload.dir.join(&month);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(dir.join(&name), &data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to write upload: {e}")))?;

    let url = format!(
        "{}/{month}/{name}",
        state.config.upload.url_prefix.trim_end_matches('/')
    );
    tracing::info!("Stored upload {original:?} as {url} ({} bytes)", data.len());

    Ok(succ(
        "succ",
        UploadResponse {
            name: original,
            url,
            size: data.len(),
        },
    ))
}
