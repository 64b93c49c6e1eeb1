use std::io;
use std::path::Path;

use axum::{
    extract::{multipart::Field, Multipart, State},
    routing::post,
    Json, Router,
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::models::{AppState, UploadResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload_files", post(upload_files))
        .with_state(state)
}

/// Store every `files` part under its client-supplied name. An existing file
/// with the same name is overwritten.
async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut filenames = Vec::new();
    let mut paths = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidRequest("Uploaded file has no filename".to_string()))?;

        let path = state.config.knowledge_dir.join(&filename);
        let size = save_field(&mut field, &path)
            .await
            .map_err(|source| AppError::Upload {
                filename: filename.clone(),
                source,
            })?;

        info!(filename = %filename, path = %path.display(), size, "File uploaded");

        paths.push(path.to_string_lossy().into_owned());
        filenames.push(filename);
    }

    if filenames.is_empty() {
        return Err(AppError::InvalidRequest(
            "No files provided in field 'files'".to_string(),
        ));
    }

    Ok(Json(UploadResponse { filenames, paths }))
}

async fn save_field(field: &mut Field<'_>, path: &Path) -> io::Result<u64> {
    let mut file = fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| io::Error::other(e.to_string()))?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
