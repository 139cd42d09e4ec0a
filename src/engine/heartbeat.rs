use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::CapabilityProfile;
use super::classifier::{Classifier, EngagementAction};
use super::cooldown::{ActionClass, CooldownController};
use super::ledger::ActivityLedger;
use super::verify::ChallengeSolver;
use crate::config::Config;
use crate::error::{KrillError, Result};
use crate::llm::TextGenerator;
use crate::platform::PlatformClient;
use crate::platform::types::{FeedItem, VerificationChallenge};
use crate::policy;

/// How many supplementary search hits get logged per cycle.
const SEARCH_SAMPLE: usize = 3;

/// How a cycle ended. `Debounced` and `AwaitingClaim` are routine skips,
/// not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The previous cycle completed too recently.
    Debounced,
    /// Registered but not yet claimed by a human; nothing to do.
    AwaitingClaim,
    Completed,
}

/// Knobs the loop runs with, lifted out of [`Config`] at construction.
#[derive(Debug, Clone)]
pub struct EngineTuning {
    pub min_cycle_interval: Duration,
    pub feed_limit: u32,
    pub search_limit: u32,
    pub action_delay: Duration,
    pub submolt: String,
}

impl EngineTuning {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_cycle_interval: Duration::from_secs(config.heartbeat.interval_minutes * 60),
            feed_limit: config.heartbeat.feed_limit,
            search_limit: config.heartbeat.search_limit,
            action_delay: Duration::from_secs(config.heartbeat.action_delay_secs),
            submolt: config.agent.submolt.clone(),
        }
    }
}

/// The pull loop: fetch feed, classify, decide, act, verify, record.
/// Everything is outbound; the engine never accepts inbound requests.
///
/// One engine instance owns its cooldowns and completion marker, so
/// several agents can coexist in one process (and in tests). Overlap
/// protection is the debounce guard, not a lock: a manual trigger that
/// clears the marker may race a scheduled one by design.
pub struct HeartbeatEngine {
    client: Arc<PlatformClient>,
    generator: Arc<dyn TextGenerator>,
    solver: ChallengeSolver,
    classifier: Classifier,
    cooldowns: CooldownController,
    ledger: ActivityLedger,
    profile: CapabilityProfile,
    tuning: EngineTuning,
    last_check: Option<Instant>,
}

impl HeartbeatEngine {
    pub fn new(
        client: Arc<PlatformClient>,
        generator: Arc<dyn TextGenerator>,
        classifier: Classifier,
        cooldowns: CooldownController,
        ledger: ActivityLedger,
        profile: CapabilityProfile,
        tuning: EngineTuning,
    ) -> Self {
        let solver = ChallengeSolver::new(Arc::clone(&generator));
        Self {
            client,
            generator,
            solver,
            classifier,
            cooldowns,
            ledger,
            profile,
            tuning,
            last_check: None,
        }
    }

    pub fn ledger(&self) -> &ActivityLedger {
        &self.ledger
    }

    /// Scheduled entry point: runs one cycle unless the previous one
    /// finished within the minimum inter-cycle interval.
    pub async fn run_scheduled(&mut self) -> Result<CycleOutcome> {
        if let Some(last) = self.last_check {
            if last.elapsed() < self.tuning.min_cycle_interval {
                debug!("heartbeat ran recently, skipping");
                return Ok(CycleOutcome::Debounced);
            }
        }

        let result = self.run_cycle().await;
        // The completion marker moves on every path, including failures, so
        // a persistently failing remote cannot hot-loop the scheduler.
        self.last_check = Some(Instant::now());

        if let Err(e) = &result {
            error!("heartbeat cycle failed: {e}");
        }
        result
    }

    /// Manual entry point: clears the marker first, bypassing the guard.
    pub async fn trigger_now(&mut self) -> Result<CycleOutcome> {
        info!("manual heartbeat trigger");
        self.last_check = None;
        self.run_scheduled().await
    }

    async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        info!("heartbeat cycle starting");

        // 1. Are we claimed yet?
        let status = self.client.agent_status().await?;
        if !status.is_claimed() {
            info!(status = %status.status, "agent not claimed yet, waiting for human verification");
            return Ok(CycleOutcome::AwaitingClaim);
        }

        // 2. Pull the feed; the personalized feed needs subscriptions, so
        // fall back to the global posts feed when it is denied.
        let envelope = match self.client.feed(self.tuning.feed_limit).await {
            Ok(envelope) => envelope,
            Err(err) if err.is_auth() => {
                warn!("feed endpoint denied, using global posts instead");
                self.client.posts("new", self.tuning.feed_limit).await?
            }
            Err(err) => return Err(err.into()),
        };
        let items = envelope.items();
        info!(count = items.len(), "retrieved feed items");

        // 3. Keep only what we can speak to; the rest is dropped unrecorded.
        let relevant: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| self.classifier.is_relevant(item))
            .collect();
        info!(count = relevant.len(), "relevant items");

        // 4. Engage, in feed order.
        for item in &relevant {
            self.process_item(item).await?;
        }

        // 5. Look beyond the feed for relevant discussions.
        let search_hits = self.search_for_discussions().await;

        // 6. Settle any posts still awaiting verification.
        self.verify_pending_posts().await;

        // 7. Nothing found anywhere? Tell the platform what we can do.
        if search_hits == 0 {
            info!("no relevant discussions found via search, announcing capabilities");
            self.announce_capabilities().await?;
        }

        info!("heartbeat cycle completed");
        Ok(CycleOutcome::Completed)
    }

    async fn process_item(&mut self, item: &FeedItem) -> Result<()> {
        let action = self.classifier.decide(item);
        debug!(post = %item.id, action = %action, "engagement decision");

        match action {
            EngagementAction::UpvoteOnly => self.upvote_item(item).await?,
            action if action.is_comment() => {
                if self.comment_on(item, action).await? {
                    self.pace().await;
                }
            }
            _ => {
                debug!(post = %item.id, "observing, no action");
                self.ledger.record_observation(&item.id, &item.display_title());
            }
        }
        Ok(())
    }

    async fn upvote_item(&mut self, item: &FeedItem) -> Result<()> {
        let verdict = policy::validate(policy::ACTION_UPVOTE);
        if !verdict.allowed {
            warn!(post = %item.id, reason = %verdict.reason, "upvote blocked by policy");
            return Ok(());
        }

        info!(post = %item.id, "upvoting");
        if let Err(err) = self.client.upvote(&item.id).await {
            if err.is_rate_limit() {
                warn!(post = %item.id, "rate limited while upvoting: {err}");
                self.ledger
                    .record_error(&format!("rate limit hit upvoting post {}", item.id));
            } else {
                self.ledger
                    .record_error(&format!("failed to upvote post {}: {err}", item.id));
                return Err(err.into());
            }
        }
        self.pace().await;
        Ok(())
    }

    /// Returns `true` when a side effect was attempted (so the caller
    /// paces); cooldown and policy skips leave no trace beyond a log line.
    async fn comment_on(&mut self, item: &FeedItem, action: EngagementAction) -> Result<bool> {
        if !self.cooldowns.can_comment() {
            debug!(post = %item.id, "comment cooldown active, skipping");
            return Ok(false);
        }

        let verdict = policy::validate(policy::ACTION_CREATE_COMMENT);
        if !verdict.allowed {
            warn!(post = %item.id, reason = %verdict.reason, "comment blocked by policy");
            return Ok(false);
        }
        if verdict.requires_confirmation {
            info!(post = %item.id, reason = %verdict.reason, "comment flagged for confirmation");
        }

        let prompt = engagement_prompt(item, action);
        let reply = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                self.ledger.record_error(&format!(
                    "comment generation failed for post {}: {err}",
                    item.id
                ));
                return Err(KrillError::Other(err.context("comment generation failed")));
            }
        };

        let title = item.display_title();
        info!(post = %item.id, "commenting");
        match self.client.create_comment(&item.id, &reply).await {
            Ok(()) => {
                self.cooldowns.record_comment();
                // Secondary action: upvote what we engaged with.
                if let Err(err) = self.client.upvote(&item.id).await {
                    warn!(post = %item.id, "secondary upvote failed: {err}");
                }
                self.ledger.record_comment(&item.id, &title, &reply, true);
            }
            Err(err) if err.is_rate_limit() => {
                warn!(post = %item.id, "comment rate limited: {err}");
                if let Some(body) = err.body() {
                    self.cooldowns
                        .apply_rate_limit_hint(body, ActionClass::Comment);
                }
                self.ledger.record_comment(&item.id, &title, &reply, false);
                self.ledger
                    .record_error(&format!("rate limit hit for comment on post {}", item.id));
            }
            Err(err) => {
                self.ledger.record_comment(&item.id, &title, &reply, false);
                self.ledger
                    .record_error(&format!("failed to comment on post {}: {err}", item.id));
                return Err(err.into());
            }
        }
        Ok(true)
    }

    /// Semantic search for discussions the feed didn't surface. Read-only:
    /// results are counted and sampled for the log, never engaged with.
    /// Errors count as zero results.
    async fn search_for_discussions(&self) -> usize {
        match self
            .client
            .search(&self.profile.search_query, "posts", self.tuning.search_limit)
            .await
        {
            Ok(envelope) => {
                let results = envelope.items();
                info!(count = results.len(), "search results");
                for hit in results.iter().take(SEARCH_SAMPLE) {
                    info!(title = %hit.display_title(), "search hit");
                }
                results.len()
            }
            Err(err) => {
                warn!("search failed, treating as no results: {err}");
                0
            }
        }
    }

    /// Solve and submit verification for every pending post. A failed
    /// submission is recorded but does not stop the rest of the batch.
    async fn verify_pending_posts(&self) {
        let profile = match self.client.profile().await {
            Ok(profile) => profile,
            Err(err) => {
                warn!("profile fetch failed: {err}");
                self.ledger
                    .record_error(&format!("failed to check pending posts: {err}"));
                return;
            }
        };

        let pending = profile.pending_posts();
        if pending.is_empty() {
            debug!("no pending posts to verify");
            return;
        }
        info!(count = pending.len(), "pending posts requiring verification");

        for post in pending {
            let Some(challenge) = &post.verification else {
                continue;
            };
            match self.submit_verification(challenge).await {
                Ok(()) => {
                    info!(post = %post.id, "verified pending post");
                    self.ledger.record_post(
                        &post.id,
                        "Verified pending post",
                        &format!("successfully verified post {}", post.id),
                        true,
                    );
                }
                Err(err) => {
                    warn!(post = %post.id, "verification failed: {err}");
                    self.ledger.record_error(&format!(
                        "failed to verify pending post {}: {err}",
                        post.id
                    ));
                }
            }
            self.pace().await;
        }
    }

    /// One solver path for both verification sources.
    async fn submit_verification(&self, challenge: &VerificationChallenge) -> anyhow::Result<()> {
        info!(code = %challenge.code, "solving verification challenge");
        let answer = self.solver.solve(&challenge.challenge).await?;
        info!(answer = %answer, "submitting verification answer");
        self.client.verify_post(&challenge.code, &answer).await?;
        Ok(())
    }

    async fn announce_capabilities(&mut self) -> Result<()> {
        if !self.cooldowns.can_post() {
            if let Some(remaining) = self.cooldowns.remaining_before_post() {
                info!(
                    minutes = remaining.as_secs() / 60,
                    "post cooldown active, skipping announcement"
                );
            }
            return Ok(());
        }

        let verdict = policy::validate(policy::ACTION_CREATE_POST);
        if !verdict.allowed {
            warn!(reason = %verdict.reason, "announcement blocked by policy");
            return Ok(());
        }
        if verdict.requires_confirmation {
            info!(reason = %verdict.reason, "announcement flagged for confirmation");
        }

        let prompt = announcement_prompt(&self.profile);
        let content = match self.generator.generate(&prompt).await {
            Ok(content) => strip_quotes(content.trim()).to_string(),
            Err(err) => {
                self.ledger
                    .record_error(&format!("announcement generation failed: {err}"));
                return Err(KrillError::Other(
                    err.context("announcement generation failed"),
                ));
            }
        };

        let title = format!("{} is online and ready to help", self.profile.agent_name);
        info!("posting capability announcement");
        match self
            .client
            .create_post(&self.tuning.submolt, &title, &content)
            .await
        {
            Ok(receipt) => {
                self.cooldowns.record_post();
                if let Some(challenge) = &receipt.verification {
                    info!("post requires verification, solving challenge");
                    if let Err(err) = self.submit_verification(challenge).await {
                        warn!("inline verification failed: {err}");
                        self.ledger
                            .record_error(&format!("verification failed: {err}"));
                    }
                }
                let subject = receipt.id.as_deref().unwrap_or("pending");
                self.ledger.record_post(subject, &title, &content, true);
                self.pace().await;
            }
            Err(err) if err.is_rate_limit() => {
                warn!("post rate limited: {err}");
                if let Some(body) = err.body() {
                    self.cooldowns.apply_rate_limit_hint(body, ActionClass::Post);
                }
                self.ledger.record_post("rate-limited", &title, &content, false);
                self.ledger
                    .record_error("rate limit hit when announcing capabilities");
            }
            Err(err) => {
                self.ledger.record_post("error", &title, &content, false);
                self.ledger
                    .record_error(&format!("failed to announce capabilities: {err}"));
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Throttle between successive outbound actions. Suspends this cycle's
    /// task only, never the process.
    async fn pace(&self) {
        tokio::time::sleep(self.tuning.action_delay).await;
    }
}

fn engagement_prompt(item: &FeedItem, action: EngagementAction) -> String {
    let author = item.author_name();
    let text = item.full_text();

    match action {
        EngagementAction::CommentWithInfo => format!(
            "@{author} asked: \"{text}\"\n\nProvide helpful information using your knowledge \
             and available capabilities."
        ),
        EngagementAction::CommentWithComparison => format!(
            "@{author} is discussing: \"{text}\"\n\nProvide a comparison or analysis if \
             relevant to your capabilities."
        ),
        EngagementAction::CommentWithRecommendation => format!(
            "@{author} needs advice: \"{text}\"\n\nProvide a recommendation based on your \
             capabilities."
        ),
        EngagementAction::UpvoteOnly | EngagementAction::ObserveOnly => text,
    }
}

fn announcement_prompt(profile: &CapabilityProfile) -> String {
    format!(
        "These are my capabilities:\n{}\n\nWrite a fun and engaging post (max 500 chars) that:\n\
         1. Opens with a light joke about the topics above\n\
         2. Introduces the capabilities\n\
         3. Invites other agents to reply with their questions\n\
         4. Is friendly and casual\n\
         5. Ends with a question to encourage engagement\n\n\
         Make it sound natural, not like an advertisement.",
        profile.summary
    )
}

/// Generators sometimes wrap the whole post in quotes; unwrap one layer.
fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_from_json(json: serde_json::Value) -> FeedItem {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn strip_quotes_removes_one_matched_pair() {
        assert_eq!(strip_quotes("\"hello\""), "hello");
        assert_eq!(strip_quotes("hello"), "hello");
        assert_eq!(strip_quotes("\"unbalanced"), "\"unbalanced");
        assert_eq!(strip_quotes("\"\"nested\"\""), "\"nested\"");
    }

    #[test]
    fn info_prompt_quotes_the_author() {
        let item = item_from_json(serde_json::json!({
            "id": "p1",
            "title": "How do EVs charge?",
            "author": {"name": "molty"},
        }));
        let prompt = engagement_prompt(&item, EngagementAction::CommentWithInfo);
        assert!(prompt.starts_with("@molty asked:"));
        assert!(prompt.contains("How do EVs charge?"));
    }

    #[test]
    fn recommendation_prompt_asks_for_advice() {
        let item = item_from_json(serde_json::json!({
            "id": "p1",
            "content": "which one should I buy?",
        }));
        let prompt = engagement_prompt(&item, EngagementAction::CommentWithRecommendation);
        assert!(prompt.contains("needs advice"));
        assert!(prompt.contains("recommendation"));
    }

    #[test]
    fn announcement_prompt_embeds_capability_summary() {
        let profile = CapabilityProfile {
            agent_name: "krill".into(),
            summary: "- car pricing: look up market prices".into(),
            search_query: String::new(),
        };
        let prompt = announcement_prompt(&profile);
        assert!(prompt.contains("car pricing"));
        assert!(prompt.contains("max 500 chars"));
    }
}
