//! Agent Factory
//!
//! Turns agent records into agent handles bound to an LLM and the shared
//! knowledge of the pipeline.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::agents::definitions::{read_definitions, AgentRecord};
use crate::agents::Agent;
use crate::knowledge::SharedKnowledge;
use crate::llm::{LlmSettings, LLM};
use crate::types::{AppError, AppResult};

/// Agents by name, in definition order.
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    agents: Vec<Arc<Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent. Names are unique within a roster.
    pub fn insert(&mut self, agent: Agent) -> AppResult<Arc<Agent>> {
        if self.index.contains_key(&agent.name) {
            return Err(AppError::DuplicateAgentName(agent.name));
        }
        let agent = Arc::new(agent);
        self.index.insert(agent.name.clone(), self.agents.len());
        self.agents.push(agent.clone());
        Ok(agent)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Agent>> {
        self.index.get(name).map(|&i| &self.agents[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.agents.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn into_agents(self) -> Vec<Arc<Agent>> {
        self.agents
    }
}

/// Per-agent overrides win over the pipeline defaults.
pub fn resolve_llm_settings(record: &AgentRecord, defaults: &LlmSettings) -> AppResult<LlmSettings> {
    let temperature = record
        .llm_model_config
        .as_ref()
        .and_then(|c| c.temperature)
        .unwrap_or(defaults.temperature);

    let mut settings = LlmSettings {
        model: record.llm_model.clone().unwrap_or_else(|| defaults.model.clone()),
        temperature,
        ..defaults.clone()
    };
    if let Some(url) = &record.llm_base_url {
        settings.override_endpoint(url.clone())?;
    }
    Ok(settings)
}

pub fn build_agents(
    records: Vec<AgentRecord>,
    defaults: &LlmSettings,
    knowledge: &SharedKnowledge,
) -> AppResult<AgentRoster> {
    let mut roster = AgentRoster::new();

    for record in records {
        if record.name.trim().is_empty() {
            return Err(AppError::InvalidDefinition(format!(
                "agent with role '{}' has an empty name",
                record.role
            )));
        }

        let settings = resolve_llm_settings(&record, defaults)?;
        let llm = LLM::new(settings)?;

        debug!(
            agent = %record.name,
            model = %llm.settings().model,
            base_url = %llm.base_url(),
            allow_delegation = record.allow_delegation,
            "Agent materialized"
        );

        roster.insert(Agent {
            name: record.name,
            role: record.role,
            goal: record.goal,
            backstory: record.backstory,
            allow_delegation: record.allow_delegation,
            llm,
            knowledge: knowledge.clone(),
        })?;
    }

    Ok(roster)
}

pub fn load_agents(
    path: &Path,
    defaults: &LlmSettings,
    knowledge: &SharedKnowledge,
) -> AppResult<AgentRoster> {
    let records: Vec<AgentRecord> = read_definitions(path)?;
    let roster = build_agents(records, defaults, knowledge)?;
    info!(path = %path.display(), agents = roster.len(), "Agents loaded");
    Ok(roster)
}
