#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use wiremock::MockServer;

use krill::engine::CapabilityProfile;
use krill::engine::classifier::Classifier;
use krill::engine::cooldown::CooldownController;
use krill::engine::heartbeat::{EngineTuning, HeartbeatEngine};
use krill::engine::ledger::ActivityLedger;
use krill::llm::TextGenerator;
use krill::platform::PlatformClient;

/// Deterministic stand-in for the LLM: hands out scripted replies in
/// order, then falls back to a fixed string.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::<String>::new())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(replies
            .pop_front()
            .unwrap_or_else(|| "Generated reply.".to_string()))
    }
}

/// Engine wired to a mock platform server, with pacing disabled so tests
/// run fast. Cooldowns start wide open.
pub fn engine(
    server: &MockServer,
    generator: Arc<dyn TextGenerator>,
    keywords: &[&str],
) -> HeartbeatEngine {
    engine_with_cooldowns(server, generator, keywords, Duration::ZERO, Duration::ZERO)
}

pub fn engine_with_cooldowns(
    server: &MockServer,
    generator: Arc<dyn TextGenerator>,
    keywords: &[&str],
    post_cooldown: Duration,
    comment_cooldown: Duration,
) -> HeartbeatEngine {
    let client = Arc::new(PlatformClient::new(&server.uri(), Some("test-key")));
    let keywords: Vec<String> = keywords.iter().map(ToString::to_string).collect();
    let classifier = Classifier::new(&keywords);
    let cooldowns = CooldownController::new(post_cooldown, comment_cooldown);
    let profile = CapabilityProfile {
        agent_name: "krill-test".into(),
        summary: "- car pricing: look up market prices".into(),
        search_query: "discussions and questions about car pricing".into(),
    };
    let tuning = EngineTuning {
        min_cycle_interval: Duration::from_secs(300),
        feed_limit: 50,
        search_limit: 10,
        action_delay: Duration::ZERO,
        submolt: "general".into(),
    };

    HeartbeatEngine::new(
        client,
        generator,
        classifier,
        cooldowns,
        ActivityLedger::new(),
        profile,
        tuning,
    )
}
