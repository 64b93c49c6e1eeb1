// Type definitions and enums

use std::path::PathBuf;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Ollama,
    OpenAI,
}

impl LLMProvider {
    /// Split a `provider/model` name into its provider and the model id the
    /// backend expects. Bare names are served by Ollama.
    pub fn parse_model(model: &str) -> AppResult<(LLMProvider, String)> {
        match model.split_once('/') {
            None => Ok((LLMProvider::Ollama, model.to_string())),
            Some(("ollama", rest)) => Ok((LLMProvider::Ollama, rest.to_string())),
            Some(("openai", rest)) => Ok((LLMProvider::OpenAI, rest.to_string())),
            Some((other, _)) => Err(AppError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Ollama => write!(f, "ollama"),
            LLMProvider::OpenAI => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Definition file not found: {}", .path.display())]
    DefinitionNotFound { path: PathBuf },

    #[error("Failed to parse YAML file at {}: {source}", .path.display())]
    DefinitionParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Agent '{agent}' not found for task '{task}'")]
    UnknownAgentReference { agent: String, task: String },

    #[error("Context task '{context}' is not defined before task '{task}'")]
    UnknownContextTask { context: String, task: String },

    #[error("Duplicate agent name '{0}'")]
    DuplicateAgentName(String),

    #[error("Duplicate task name '{0}'")]
    DuplicateTaskName(String),

    #[error("Unsupported LLM provider '{0}'")]
    UnsupportedProvider(String),

    #[error("{0}")]
    NoKnowledgeSources(String),

    #[error("Failed to read knowledge file {}: {source}", .path.display())]
    KnowledgeRead { path: PathBuf, source: csv::Error },

    #[error("Error uploading {filename}: {source}")]
    Upload {
        filename: String,
        source: std::io::Error,
    },

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("CrewAI execution failed: {0}")]
    PipelineExecution(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DefinitionNotFound { .. }
            | AppError::NotFound(_)
            | AppError::NoKnowledgeSources(_) => StatusCode::NOT_FOUND,
            AppError::DefinitionParse { .. }
            | AppError::InvalidDefinition(_)
            | AppError::UnknownAgentReference { .. }
            | AppError::UnknownContextTask { .. }
            | AppError::DuplicateAgentName(_)
            | AppError::DuplicateTaskName(_)
            | AppError::UnsupportedProvider(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigNotFound { .. }
            | AppError::ConfigParse { .. }
            | AppError::KnowledgeRead { .. }
            | AppError::Upload { .. }
            | AppError::LLMApi(_)
            | AppError::PipelineExecution(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }
        let body = ErrorDetail {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_prefixes() {
        let (provider, model) = LLMProvider::parse_model("ollama/gemma3").unwrap();
        assert_eq!(provider, LLMProvider::Ollama);
        assert_eq!(model, "gemma3");

        let (provider, model) = LLMProvider::parse_model("openai/gpt-4o-mini").unwrap();
        assert_eq!(provider, LLMProvider::OpenAI);
        assert_eq!(model, "gpt-4o-mini");

        let (provider, model) = LLMProvider::parse_model("llama3.1:8b").unwrap();
        assert_eq!(provider, LLMProvider::Ollama);
        assert_eq!(model, "llama3.1:8b");
    }

    #[test]
    fn test_parse_model_rejects_unknown_provider() {
        let err = LLMProvider::parse_model("bedrock/claude").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedProvider(ref p) if p == "bedrock"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NoKnowledgeSources("empty".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::UnknownAgentReference {
                agent: "a".into(),
                task: "t".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PipelineExecution("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::UnknownAgentReference {
            agent: "ghost".into(),
            task: "write".into(),
        };
        assert_eq!(err.to_string(), "Agent 'ghost' not found for task 'write'");

        let err = AppError::PipelineExecution("Crew failed unexpectedly".into());
        assert_eq!(
            err.to_string(),
            "CrewAI execution failed: Crew failed unexpectedly"
        );
    }
}
