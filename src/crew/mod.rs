//! Pipeline Executor
//!
//! A crew runs its tasks strictly in definition order, one LLM call per task.
//! Each task sees the outputs of the context tasks it declared; the last
//! task's output is the result of the whole run. The first failing task
//! aborts the run.

pub mod builder;
pub mod prompt;
pub mod runner;

pub use builder::create_data_analysis_crew;
pub use prompt::{interpolate, TaskPrompt};
pub use runner::{CrewRunner, PipelineRunner};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agents::{Agent, Task};
use crate::types::{AppError, AppResult, TokenUsage};

pub const DEFAULT_RESULTS_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub name: String,
    pub agent_role: String,
    pub description: String,
    pub raw: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    pub usage: TokenUsage,
}

/// Agents and tasks assembled for one sequential run.
#[derive(Debug, Clone)]
pub struct Crew {
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    results_limit: usize,
}

impl Crew {
    pub fn new(agents: Vec<Arc<Agent>>, tasks: Vec<Task>) -> Self {
        Self {
            agents,
            tasks,
            results_limit: DEFAULT_RESULTS_LIMIT,
        }
    }

    /// Maximum knowledge chunks handed to an agent per knowledge source.
    pub fn with_results_limit(mut self, limit: usize) -> Self {
        self.results_limit = limit;
        self
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn coworkers_of(&self, agent: &Agent) -> Vec<&str> {
        self.agents
            .iter()
            .filter(|a| a.name != agent.name)
            .map(|a| a.role.as_str())
            .collect()
    }

    pub async fn kickoff(&self, inputs: &HashMap<String, String>) -> AppResult<CrewOutput> {
        if self.tasks.is_empty() {
            return Err(AppError::InvalidDefinition("crew has no tasks".to_string()));
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            %run_id,
            agents = self.agents.len(),
            tasks = self.tasks.len(),
            "Crew kickoff"
        );

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (position, task) in self.tasks.iter().enumerate() {
            let output = self
                .execute_task(position, task, inputs, &outputs)
                .await
                .map_err(|e| {
                    warn!(%run_id, task = %task.name, error = %e, "Task failed, aborting crew");
                    match e {
                        AppError::PipelineExecution(_) => e,
                        other => AppError::PipelineExecution(format!(
                            "task '{}' failed: {}",
                            task.name, other
                        )),
                    }
                })?;
            outputs.push(output);
        }

        let usage = outputs.iter().fold(TokenUsage::default(), |mut acc, o| {
            acc.prompt_tokens += o.usage.prompt_tokens;
            acc.completion_tokens += o.usage.completion_tokens;
            acc.total_tokens += o.usage.total_tokens;
            acc
        });

        let raw = outputs
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();

        info!(
            %run_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = usage.total_tokens,
            "Crew finished"
        );

        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
            usage,
        })
    }

    async fn execute_task(
        &self,
        position: usize,
        task: &Task,
        inputs: &HashMap<String, String>,
        previous: &[TaskOutput],
    ) -> AppResult<TaskOutput> {
        let agent = task.agent.as_ref();
        let description = interpolate(&task.description, inputs);
        let expected_output = interpolate(&task.expected_output, inputs);

        let mut context = Vec::with_capacity(task.context.len());
        for &index in &task.context {
            let output = previous.get(index).filter(|_| index < position).ok_or_else(|| {
                AppError::PipelineExecution(format!(
                    "task '{}' depends on a task that has not run yet",
                    task.name
                ))
            })?;
            context.push(output.raw.as_str());
        }

        let knowledge_summaries: Vec<String> = agent.knowledge.iter().map(|k| k.summary()).collect();
        let knowledge: Vec<_> = agent
            .knowledge
            .iter()
            .flat_map(|k| k.retrieve(&description, self.results_limit))
            .collect();

        let prompt = TaskPrompt {
            agent,
            coworkers: self.coworkers_of(agent),
            description: &description,
            expected_output: &expected_output,
            context,
            knowledge_summaries,
            knowledge,
        };

        debug!(
            task = %task.name,
            agent = %agent.name,
            model = %agent.llm.model_id(),
            context_tasks = task.context.len(),
            "Executing task"
        );

        let response = agent.llm.complete(prompt.messages()).await?;

        if response.content.trim().is_empty() {
            return Err(AppError::PipelineExecution(format!(
                "task '{}' failed: empty response from LLM",
                task.name
            )));
        }

        info!(
            task = %task.name,
            response_len = response.content.len(),
            "Task complete"
        );

        Ok(TaskOutput {
            name: task.name.clone(),
            agent_role: agent.role.clone(),
            description,
            raw: response.content,
            usage: response.usage,
        })
    }
}
