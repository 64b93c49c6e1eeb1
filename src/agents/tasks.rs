//! Task Graph Builder
//!
//! Tasks run in the order they are defined. A task may only take context from
//! tasks defined before it, so the definition order is also a valid
//! dependency order and the graph cannot contain cycles.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::agents::definitions::{read_definitions, TaskRecord};
use crate::agents::factory::AgentRoster;
use crate::agents::Agent;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    /// Template; `{question}` and other input keys are filled at kickoff.
    pub description: String,
    pub expected_output: String,
    pub agent: Arc<Agent>,
    /// Positions of the context tasks in the graph, in declared order.
    pub context: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}

pub fn build_tasks(records: Vec<TaskRecord>, agents: &AgentRoster) -> AppResult<TaskGraph> {
    let mut graph = TaskGraph::default();

    for record in records {
        let agent = agents
            .get(&record.agent_name)
            .cloned()
            .ok_or_else(|| AppError::UnknownAgentReference {
                agent: record.agent_name.clone(),
                task: record.name.clone(),
            })?;

        if graph.index.contains_key(&record.name) {
            return Err(AppError::DuplicateTaskName(record.name));
        }

        let mut context = Vec::new();
        if let Some(refs) = &record.context_task {
            for name in refs.names() {
                let position =
                    graph
                        .position(name)
                        .ok_or_else(|| AppError::UnknownContextTask {
                            context: name.to_string(),
                            task: record.name.clone(),
                        })?;
                if !context.contains(&position) {
                    context.push(position);
                }
            }
        }

        graph.index.insert(record.name.clone(), graph.tasks.len());
        graph.tasks.push(Task {
            name: record.name,
            description: record.description,
            expected_output: record.expected_output,
            agent,
            context,
        });
    }

    Ok(graph)
}

pub fn load_tasks(path: &Path, agents: &AgentRoster) -> AppResult<TaskGraph> {
    let records: Vec<TaskRecord> = read_definitions(path)?;
    let graph = build_tasks(records, agents)?;
    info!(path = %path.display(), tasks = graph.len(), "Tasks loaded");
    Ok(graph)
}
