//! YAML agent and task definitions.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{AppError, AppResult};

/// One entry of the agent definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub llm_base_url: Option<String>,
    #[serde(default)]
    pub llm_model_config: Option<ModelConfig>,
    #[serde(default = "default_allow_delegation")]
    pub allow_delegation: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_allow_delegation() -> bool {
    true
}

/// One entry of the task definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent_name: String,
    #[serde(default)]
    pub context_task: Option<ContextRef>,
}

/// `context_task` accepts a single task name or a list of names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ContextRef {
    One(String),
    Many(Vec<String>),
}

impl ContextRef {
    pub fn names(&self) -> Vec<&str> {
        match self {
            ContextRef::One(name) => vec![name.as_str()],
            ContextRef::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Read a YAML list of records. An empty document yields no records.
pub fn read_definitions<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::DefinitionNotFound {
            path: path.to_path_buf(),
        },
        _ => AppError::Io(e),
    })?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Option<Vec<T>> =
        serde_yaml::from_str(&content).map_err(|source| AppError::DefinitionParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(records.unwrap_or_default())
}
