use std::sync::Arc;

use crate::config::ServerConfig;
use crate::crew::PipelineRunner;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub runner: Arc<dyn PipelineRunner>,
}

impl AppState {
    pub fn new(config: ServerConfig, runner: Arc<dyn PipelineRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadResponse {
    pub filenames: Vec<String>,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
    /// CSV in the knowledge folder to analyze; the first one listed when absent.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
