use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::llm::LlmSettings;
use crate::types::{AppError, AppResult};

pub const DEFAULT_LLM_MODEL: &str = "ollama/gemma3";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub knowledge_dir: PathBuf,
    pub crew_config_path: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub openai_api_key: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8090".to_string())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            knowledge_dir: env::var("KNOWLEDGE_DIR")
                .unwrap_or_else(|_| "knowledge".to_string())
                .into(),
            crew_config_path: env::var("CREW_CONFIG")
                .unwrap_or_else(|_| "config.json".to_string())
                .into(),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse()?,
            cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8501".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
        })
    }

    /// Settings used by tests and embedders that do not read the environment.
    pub fn with_knowledge_dir(knowledge_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 8090,
            host: "127.0.0.1".to_string(),
            knowledge_dir: knowledge_dir.into(),
            crew_config_path: PathBuf::from("config.json"),
            max_upload_bytes: 50 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
            openai_api_key: None,
        }
    }
}

/// Pipeline configuration read from the JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct CrewConfig {
    /// Path to the YAML agent definitions.
    #[serde(rename = "agent_name")]
    pub agents_file: PathBuf,
    /// Path to the YAML task definitions.
    #[serde(rename = "task_name")]
    pub tasks_file: PathBuf,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    /// Endpoint for `openai/<model>` names; any OpenAI-compatible server.
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub llm_temperature: f32,
    #[serde(default = "default_results_limit")]
    pub knowledge_results_limit: usize,
    #[serde(default = "default_chunk_rows")]
    pub knowledge_chunk_rows: usize,
    #[serde(default)]
    pub llm_timeout_secs: Option<u64>,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_results_limit() -> usize {
    10
}

fn default_chunk_rows() -> usize {
    25
}

impl CrewConfig {
    /// Read the JSON config at `path`. Relative definition file paths are
    /// resolved against the directory holding the config file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => AppError::Io(e),
        })?;

        let mut config: CrewConfig =
            serde_json::from_str(&content).map_err(|source| AppError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.agents_file = base.join(&config.agents_file);
        config.tasks_file = base.join(&config.tasks_file);

        if config.knowledge_chunk_rows == 0 {
            config.knowledge_chunk_rows = default_chunk_rows();
        }

        Ok(config)
    }

    /// The LLM binding every agent falls back to.
    pub fn default_llm(&self) -> LlmSettings {
        LlmSettings {
            model: self.llm_model.clone(),
            ollama_base_url: self.ollama_base_url.clone(),
            openai_base_url: self.openai_base_url.clone(),
            temperature: self.llm_temperature,
            timeout_secs: self.llm_timeout_secs,
            api_key: self.openai_api_key.clone(),
        }
    }
}
