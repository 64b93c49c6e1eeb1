use std::path::Path;

use tracing::info;

use crate::agents::{load_agents, load_tasks};
use crate::config::CrewConfig;
use crate::crew::Crew;
use crate::knowledge::load_knowledge;
use crate::types::AppResult;

/// Assemble the analysis crew for one request: knowledge, then agents, then
/// tasks. Definitions are re-read on every call.
pub fn create_data_analysis_crew(
    config: &CrewConfig,
    knowledge_dir: &Path,
    knowledge_path: &Path,
) -> AppResult<Crew> {
    let knowledge = load_knowledge(knowledge_dir, knowledge_path, config.knowledge_chunk_rows)?;
    let agents = load_agents(&config.agents_file, &config.default_llm(), &knowledge)?;
    let tasks = load_tasks(&config.tasks_file, &agents)?;

    info!(
        knowledge = %knowledge_path.display(),
        agents = agents.len(),
        tasks = tasks.len(),
        "Data analysis crew assembled"
    );

    Ok(Crew::new(agents.into_agents(), tasks.into_tasks())
        .with_results_limit(config.knowledge_results_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    const AGENTS: &str = r#"
- name: retriever
  role: Data Retriever Specialist
  goal: Retrieve data.
  backstory: Knows CSV files.
  allow_delegation: false
- name: writer
  role: Technical Report Writer
  goal: Write.
  backstory: Writes well.
  llm_model: ollama/llama3
  llm_model_config:
    temperature: 0.4
"#;

    const TASKS: &str = r#"
- name: retrieval_task
  description: "User query: '{question}'."
  expected_output: Raw data.
  agent_name: retriever
- name: writing_task
  description: Write the report for '{question}'.
  expected_output: Markdown.
  agent_name: writer
  context_task: retrieval_task
"#;

    fn fixture(tasks: &str) -> (TempDir, CrewConfig, PathBuf) {
        let dir = tempdir().unwrap();
        let knowledge_dir = dir.path().join("knowledge");
        fs::create_dir_all(&knowledge_dir).unwrap();
        fs::write(knowledge_dir.join("sales.csv"), "product,units\nA,10\nB,3\n").unwrap();
        fs::write(dir.path().join("agents.yaml"), AGENTS).unwrap();
        fs::write(dir.path().join("tasks.yaml"), tasks).unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"agent_name": "agents.yaml", "task_name": "tasks.yaml", "llm_temperature": 0.1}"#,
        )
        .unwrap();
        let config = CrewConfig::load(&dir.path().join("config.json")).unwrap();
        (dir, config, knowledge_dir)
    }

    #[test]
    fn test_assembles_agents_and_tasks() {
        let (_dir, config, knowledge_dir) = fixture(TASKS);
        let crew = create_data_analysis_crew(&config, &knowledge_dir, Path::new("sales.csv")).unwrap();

        assert_eq!(crew.agents().len(), 2);
        assert_eq!(crew.tasks().len(), 2);

        let retriever = &crew.agents()[0];
        let writer = &crew.agents()[1];
        assert!(!retriever.allow_delegation);
        assert!(writer.allow_delegation);
        assert_eq!(retriever.llm.settings().model, "ollama/gemma3");
        assert!((retriever.llm.settings().temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(writer.llm.settings().model, "ollama/llama3");
        assert!((writer.llm.settings().temperature - 0.4).abs() < f32::EPSILON);
        assert!(Arc::ptr_eq(&retriever.knowledge, &writer.knowledge));
        assert_eq!(retriever.knowledge[0].name(), "sales.csv");
    }

    #[test]
    fn test_unknown_agent_fails_the_build() {
        let tasks = "- name: t\n  description: d\n  expected_output: e\n  agent_name: ghost\n";
        let (_dir, config, knowledge_dir) = fixture(tasks);
        let err = create_data_analysis_crew(&config, &knowledge_dir, Path::new("sales.csv")).unwrap_err();
        assert!(matches!(err, AppError::UnknownAgentReference { .. }));
    }

    #[test]
    fn test_missing_knowledge_fails_before_definitions() {
        let (_dir, config, knowledge_dir) = fixture(TASKS);
        let err = create_data_analysis_crew(&config, &knowledge_dir, Path::new("other.csv")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
