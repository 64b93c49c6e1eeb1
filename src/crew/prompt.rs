//! Prompt composition for a single task.

use std::collections::HashMap;

use crate::agents::Agent;
use crate::knowledge::KnowledgeChunk;
use crate::types::LLMMessage;

const CONTEXT_SEPARATOR: &str = "\n\n----------\n\n";

fn is_placeholder(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Replace `{key}` with `inputs[key]`. Braces that do not name a known input
/// are kept as written.
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match inputs.get(key) {
                    Some(value) if is_placeholder(key) => {
                        out.push_str(value);
                        rest = &after[end + 1..];
                    }
                    _ => {
                        out.push('{');
                        rest = after;
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Everything the agent sees for one task.
pub struct TaskPrompt<'a> {
    pub agent: &'a Agent,
    pub coworkers: Vec<&'a str>,
    pub description: &'a str,
    pub expected_output: &'a str,
    pub context: Vec<&'a str>,
    pub knowledge_summaries: Vec<String>,
    pub knowledge: Vec<KnowledgeChunk>,
}

impl TaskPrompt<'_> {
    pub fn system_message(&self) -> String {
        let mut system = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.agent.role, self.agent.backstory, self.agent.goal
        );
        if self.agent.allow_delegation && !self.coworkers.is_empty() {
            system.push_str(&format!(
                "\nIf the information you have is insufficient you may say what is missing and \
                 which coworker should provide it. Your coworkers are: {}",
                self.coworkers.join(", ")
            ));
        }
        system
    }

    pub fn user_message(&self) -> String {
        let mut user = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        );

        if !self.context.is_empty() {
            user.push_str("\n\nThis is the context you're working with:\n");
            user.push_str(&self.context.join(CONTEXT_SEPARATOR));
        }

        if !self.knowledge_summaries.is_empty() || !self.knowledge.is_empty() {
            user.push_str("\n\nAdditional Information from the knowledge sources:\n");
            user.push_str(&self.knowledge_summaries.join("\n"));
            for chunk in &self.knowledge {
                user.push_str(&format!("\n\n[{}] {}", chunk.source, chunk.text));
            }
        }

        user.push_str("\n\nBegin! Give your best final answer.");
        user
    }

    pub fn messages(&self) -> Vec<LLMMessage> {
        vec![
            LLMMessage::system(self.system_message()),
            LLMMessage::user(self.user_message()),
        ]
    }
}
