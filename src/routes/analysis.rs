use std::path::{Component, Path, PathBuf};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tokio::fs;
use tracing::info;

use crate::knowledge::is_csv;
use crate::models::{AnalyzeRequest, AnalyzeResponse, AppState};
use crate::types::{AppError, AppResult};

const NO_CSV_MESSAGE: &str = "No CSV file found in the knowledge folder. Please upload one.";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze_data", post(analyze_data))
        .with_state(state)
}

async fn analyze_data(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let Json(request) = payload?;
    let knowledge_dir = &state.config.knowledge_dir;

    let csv_file = match request.file.as_deref() {
        Some(name) => requested_csv(knowledge_dir, name).await?,
        None => first_csv(knowledge_dir)
            .await?
            .ok_or_else(|| AppError::NotFound(NO_CSV_MESSAGE.to_string()))?,
    };

    info!(
        file = %csv_file.display(),
        query_len = request.query.len(),
        "Analysis request received"
    );

    let result = state
        .runner
        .run(&csv_file, &request.query)
        .await
        .map_err(execution_error)?;

    Ok(Json(AnalyzeResponse { result }))
}

/// Not-found and validation failures keep their status; anything else is
/// reported as a failed crew run.
fn execution_error(err: AppError) -> AppError {
    match err.status_code() {
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => err,
        _ => match err {
            AppError::PipelineExecution(_) => err,
            other => AppError::PipelineExecution(other.to_string()),
        },
    }
}

/// First `.csv` entry in directory-listing order, as a name relative to the
/// knowledge folder. The listing order is filesystem dependent.
async fn first_csv(knowledge_dir: &Path) -> AppResult<Option<PathBuf>> {
    let mut entries = match fs::read_dir(knowledge_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let name = PathBuf::from(entry.file_name());
        if is_csv(&name) && entry.file_type().await?.is_file() {
            return Ok(Some(name));
        }
    }

    Ok(None)
}

/// A CSV named by the caller. Only plain file names directly inside the
/// knowledge folder are accepted.
async fn requested_csv(knowledge_dir: &Path, name: &str) -> AppResult<PathBuf> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        return Err(AppError::InvalidRequest(format!(
            "File '{}' must be a file name inside the knowledge folder",
            name
        )));
    }

    if !is_csv(Path::new(name)) {
        return Err(AppError::InvalidRequest(format!(
            "File '{}' is not a CSV file",
            name
        )));
    }

    match fs::metadata(knowledge_dir.join(name)).await {
        Ok(meta) if meta.is_file() => Ok(PathBuf::from(name)),
        _ => Err(AppError::NotFound(format!(
            "File '{}' not found in the knowledge folder",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_first_csv_ignores_other_files() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std_fs::create_dir(dir.path().join("archive.csv")).unwrap();
        assert_eq!(first_csv(dir.path()).await.unwrap(), None);

        std_fs::write(dir.path().join("data.csv"), "a\n1\n").unwrap();
        assert_eq!(
            first_csv(dir.path()).await.unwrap(),
            Some(PathBuf::from("data.csv"))
        );
    }

    #[tokio::test]
    async fn test_first_csv_missing_folder() {
        let dir = tempdir().unwrap();
        assert_eq!(first_csv(&dir.path().join("absent")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_requested_csv_validation() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("data.csv"), "a\n1\n").unwrap();

        assert_eq!(
            requested_csv(dir.path(), "data.csv").await.unwrap(),
            PathBuf::from("data.csv")
        );
        assert!(matches!(
            requested_csv(dir.path(), "data.xlsx").await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            requested_csv(dir.path(), "other.csv").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_requested_csv_rejects_paths() {
        let root = tempdir().unwrap();
        let knowledge = root.path().join("knowledge");
        std_fs::create_dir(&knowledge).unwrap();
        std_fs::write(root.path().join("secret.csv"), "password
hunter2
").unwrap();
        std_fs::create_dir(knowledge.join("nested")).unwrap();
        std_fs::write(knowledge.join("nested").join("inner.csv"), "a\n1\n").unwrap();

        let absolute = root.path().join("secret.csv");
        for name in [
            "../secret.csv",
            absolute.to_str().unwrap(),
            "nested/inner.csv",
            "./secret.csv",
        ] {
            assert!(
                matches!(
                    requested_csv(&knowledge, name).await,
                    Err(AppError::InvalidRequest(_))
                ),
                "accepted {name}"
            );
        }
    }

    #[tokio::test]
    async fn test_csv_extension_is_case_insensitive() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("DATA.CSV"), "a\n1\n").unwrap();

        assert_eq!(
            first_csv(dir.path()).await.unwrap(),
            Some(PathBuf::from("DATA.CSV"))
        );
        assert_eq!(
            requested_csv(dir.path(), "DATA.CSV").await.unwrap(),
            PathBuf::from("DATA.CSV")
        );
    }

    #[test]
    fn test_execution_error_mapping() {
        let err = execution_error(AppError::NotFound("gone".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = execution_error(AppError::InvalidDefinition("bad".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = execution_error(AppError::LLMApi("timeout".into()));
        assert_eq!(err.to_string(), "CrewAI execution failed: LLM API error: timeout");

        let err = execution_error(AppError::PipelineExecution("boom".into()));
        assert_eq!(err.to_string(), "CrewAI execution failed: boom");
    }
}
