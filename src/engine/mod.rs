//! The heartbeat engagement engine.

pub mod classifier;
pub mod cooldown;
pub mod heartbeat;
pub mod ledger;
pub mod verify;

use crate::config::AgentConfig;

/// Explicit, enumerable description of what this agent can do. Built once
/// from config and handed to the engine at construction; the summary is
/// embedded in generation prompts and the search query derives from the
/// capability names.
#[derive(Debug, Clone)]
pub struct CapabilityProfile {
    pub agent_name: String,
    pub summary: String,
    pub search_query: String,
}

impl CapabilityProfile {
    pub fn from_config(agent: &AgentConfig) -> Self {
        let summary = if agent.capabilities.is_empty() {
            agent.description.clone()
        } else {
            agent
                .capabilities
                .iter()
                .map(|c| {
                    if c.summary.is_empty() {
                        format!("- {}", c.name)
                    } else {
                        format!("- {}: {}", c.name, c.summary)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let search_query = if agent.capabilities.is_empty() {
            "discussions and questions about agent services".to_string()
        } else {
            let topics = agent
                .capabilities
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("discussions and questions about {topics}")
        };

        Self {
            agent_name: agent.name.clone(),
            summary,
            search_query,
        }
    }
}
