use crate::platform::types::ApiErrorBody;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Which cooldown class a side effect belongs to. Posts cool down in
/// minutes, comments in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Post,
    Comment,
}

/// Enforces minimum spacing between successive side effects of the same
/// class. Durations are adjusted at runtime from server retry hints; the
/// "last action" markers are only ever moved forward by a successful
/// action or an applied hint.
pub struct CooldownController {
    last_post: Option<Instant>,
    last_comment: Option<Instant>,
    post_cooldown: Duration,
    comment_cooldown: Duration,
}

impl CooldownController {
    pub fn new(post_cooldown: Duration, comment_cooldown: Duration) -> Self {
        Self {
            last_post: None,
            last_comment: None,
            post_cooldown,
            comment_cooldown,
        }
    }

    pub fn can_post(&self) -> bool {
        self.last_post
            .is_none_or(|last| last.elapsed() >= self.post_cooldown)
    }

    pub fn can_comment(&self) -> bool {
        self.last_comment
            .is_none_or(|last| last.elapsed() >= self.comment_cooldown)
    }

    pub fn record_post(&mut self) {
        self.last_post = Some(Instant::now());
    }

    pub fn record_comment(&mut self) {
        self.last_comment = Some(Instant::now());
    }

    pub fn post_cooldown(&self) -> Duration {
        self.post_cooldown
    }

    pub fn comment_cooldown(&self) -> Duration {
        self.comment_cooldown
    }

    /// Time left until posting is allowed again, `None` when unblocked.
    pub fn remaining_before_post(&self) -> Option<Duration> {
        let last = self.last_post?;
        self.post_cooldown.checked_sub(last.elapsed())
    }

    /// Apply a server retry hint from a rate-limit error payload. On
    /// success the class's cooldown duration is overwritten and its marker
    /// reset to now, so the new window starts counting immediately.
    /// Malformed payloads are logged and ignored; existing state stands.
    pub fn apply_rate_limit_hint(&mut self, payload: &str, class: ActionClass) -> bool {
        let body: ApiErrorBody = match serde_json::from_str(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("could not parse rate-limit payload: {e}");
                return false;
            }
        };

        match class {
            ActionClass::Post => match body.retry_after_minutes {
                Some(minutes) => {
                    self.post_cooldown = Duration::from_secs(minutes * 60);
                    self.last_post = Some(Instant::now());
                    info!(minutes, "post cooldown updated from server hint");
                    true
                }
                None => {
                    warn!("rate-limit payload had no retry_after_minutes hint");
                    false
                }
            },
            ActionClass::Comment => match body.retry_after_seconds {
                Some(seconds) => {
                    self.comment_cooldown = Duration::from_secs(seconds);
                    self.last_comment = Some(Instant::now());
                    info!(seconds, "comment cooldown updated from server hint");
                    true
                }
                None => {
                    warn!("rate-limit payload had no retry_after_seconds hint");
                    false
                }
            },
        }
    }
}
