//! Agent System
//!
//! Agents and tasks are declared in YAML and materialized per request:
//!
//! - **Agent Factory**: binds each agent record to an LLM and the shared knowledge
//! - **Task Graph Builder**: binds each task to its agent and context tasks
//!
//! ## Default pipeline
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Retriever  │  → Pulls relevant rows from the CSV knowledge
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Analyst   │  → Finds trends and key figures in the retrieved data
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │   Writer    │  → Produces the markdown report
//! └─────────────┘
//!      │
//!      ▼
//!  Final Report
//! ```

pub mod definitions;
pub mod factory;
pub mod tasks;

pub use definitions::{AgentRecord, ContextRef, ModelConfig, TaskRecord};
pub use factory::{build_agents, load_agents, resolve_llm_settings, AgentRoster};
pub use tasks::{build_tasks, load_tasks, Task, TaskGraph};

use crate::knowledge::SharedKnowledge;
use crate::llm::LLM;

/// A configured persona able to work on tasks.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Rendered into the agent's instructions; delegation itself is left to
    /// the model.
    pub allow_delegation: bool,
    pub llm: LLM,
    pub knowledge: SharedKnowledge,
}
