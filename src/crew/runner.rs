use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CrewConfig;
use crate::crew::create_data_analysis_crew;
use crate::types::{AppError, AppResult};

/// Runs the analysis pipeline for a query against one knowledge file.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    async fn run(&self, knowledge_path: &Path, query: &str) -> AppResult<String>;
}

/// Builds a fresh crew from the definition files on every run.
pub struct CrewRunner {
    config: Arc<CrewConfig>,
    knowledge_dir: PathBuf,
}

impl CrewRunner {
    pub fn new(config: Arc<CrewConfig>, knowledge_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            knowledge_dir: knowledge_dir.into(),
        }
    }
}

#[async_trait]
impl PipelineRunner for CrewRunner {
    async fn run(&self, knowledge_path: &Path, query: &str) -> AppResult<String> {
        let config = self.config.clone();
        let knowledge_dir = self.knowledge_dir.clone();
        let knowledge_path = knowledge_path.to_path_buf();

        // definition and CSV parsing is blocking file IO
        let crew = tokio::task::spawn_blocking(move || {
            create_data_analysis_crew(&config, &knowledge_dir, &knowledge_path)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Crew assembly panicked: {}", e)))??;

        let inputs = HashMap::from([("question".to_string(), query.to_string())]);
        let output = crew.kickoff(&inputs).await?;
        Ok(output.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_runs_against_ollama() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Regex("highest demand".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": { "role": "assistant", "content": "# Report\nP1 leads." },
                    "done": true,
                    "done_reason": "stop"
                })
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let knowledge_dir = dir.path().join("knowledge");
        fs::create_dir_all(&knowledge_dir).unwrap();
        fs::write(knowledge_dir.join("demand.csv"), "product,demand\nP1,900\nP2,20\n").unwrap();
        fs::write(
            dir.path().join("agents.yaml"),
            "- name: analyst\n  role: Analyst\n  goal: Analyze.\n  backstory: Careful.\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("tasks.yaml"),
            r#"
- name: analysis
  description: "Analyze: {question}"
  expected_output: Findings.
  agent_name: analyst
- name: report
  description: "Report on: {question}"
  expected_output: Markdown.
  agent_name: analyst
  context_task: analysis
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("config.json"),
            json!({
                "agent_name": "agents.yaml",
                "task_name": "tasks.yaml",
                "ollama_base_url": server.url()
            })
            .to_string(),
        )
        .unwrap();

        let config = CrewConfig::load(&dir.path().join("config.json")).unwrap();
        let runner = CrewRunner::new(Arc::new(config), &knowledge_dir);
        let result = runner
            .run(Path::new("demand.csv"), "which product has the highest demand")
            .await
            .unwrap();

        assert_eq!(result, "# Report\nP1 leads.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_llm_failure_is_execution_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.csv"), "a\n1\n").unwrap();
        fs::write(
            dir.path().join("agents.yaml"),
            "- name: a\n  role: A\n  goal: G\n  backstory: B\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("tasks.yaml"),
            "- name: t\n  description: D\n  expected_output: E\n  agent_name: a\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config.json"),
            json!({"agent_name": "agents.yaml", "task_name": "tasks.yaml", "ollama_base_url": server.url()})
                .to_string(),
        )
        .unwrap();

        let config = CrewConfig::load(&dir.path().join("config.json")).unwrap();
        let runner = CrewRunner::new(Arc::new(config), dir.path());
        let err = runner.run(Path::new("data.csv"), "q").await.unwrap_err();

        assert!(matches!(err, AppError::PipelineExecution(_)));
        assert!(err.to_string().contains("Ollama API error (500"));
    }
}
