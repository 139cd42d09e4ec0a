use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::CapabilityProfile;
use crate::engine::classifier::Classifier;
use crate::engine::cooldown::CooldownController;
use crate::engine::heartbeat::{EngineTuning, HeartbeatEngine};
use crate::engine::ledger::ActivityLedger;
use crate::llm::OpenAiCompatibleGenerator;
use crate::platform::PlatformClient;

/// Run the heartbeat scheduler until interrupted.
pub async fn run(config: Arc<Config>) -> Result<()> {
    config.validate()?;
    startup_check(&config).await;

    let mut engine = build_engine(&config);
    let interval_mins = config.heartbeat.interval_minutes.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_mins * 60));
    info!(minutes = interval_mins, "heartbeat scheduler started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Failures are already logged and ledgered by the engine;
                // the next tick retries independently.
                if let Ok(outcome) = engine.run_scheduled().await {
                    debug!(?outcome, "cycle finished");
                }
                let stats = engine.ledger().stats();
                debug!(
                    posts = stats.posts,
                    comments = stats.comments,
                    observations = stats.observations,
                    errors = stats.errors,
                    "ledger stats"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Run exactly one cycle, bypassing the debounce guard, and dump the
/// resulting ledger to the log. Used by `krill beat`.
pub async fn run_once(config: Arc<Config>) -> Result<()> {
    config.validate()?;

    let mut engine = build_engine(&config);
    let outcome = engine.trigger_now().await?;
    info!(?outcome, "manual heartbeat finished");

    for record in engine.ledger().recent() {
        info!(
            kind = %record.kind,
            subject = %record.subject_id,
            outcome = ?record.outcome,
            title = %record.title,
            "activity"
        );
    }
    Ok(())
}

pub fn build_engine(config: &Config) -> HeartbeatEngine {
    let client = Arc::new(PlatformClient::new(
        &config.platform.base_url,
        config.platform.api_key.as_deref(),
    ));
    let generator = Arc::new(OpenAiCompatibleGenerator::from_config(&config.generator));
    let classifier = Classifier::new(&config.agent.keywords);
    let cooldowns = CooldownController::new(
        Duration::from_secs(config.heartbeat.post_cooldown_minutes * 60),
        Duration::from_secs(config.heartbeat.comment_cooldown_seconds),
    );
    let profile = CapabilityProfile::from_config(&config.agent);
    let tuning = EngineTuning::from_config(config);

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

/// Pre-flight report before the first tick: is the agent registered, and
/// has a human claimed it yet? Never fatal; the loop idles until claimed.
async fn startup_check(config: &Config) {
    if config.platform.api_key.is_none() {
        warn!("no platform API key configured");
        warn!("register first: `krill register`, then export KRILL_API_KEY");
        warn!("the agent will idle until a key is configured");
        return;
    }

    let client = PlatformClient::new(
        &config.platform.base_url,
        config.platform.api_key.as_deref(),
    );
    match client.agent_status().await {
        Ok(status) if status.is_claimed() => {
            info!("agent is claimed and ready");
        }
        Ok(status) => {
            warn!(status = %status.status, "agent registered but not claimed yet");
            warn!("send the claim URL to your human to activate");
        }
        Err(err) => {
            warn!("could not check agent status: {err}");
        }
    }
}
