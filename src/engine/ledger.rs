use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use strum::Display;

/// The ledger keeps this many records; the oldest is evicted on overflow,
/// FIFO by insertion order.
const MAX_ACTIVITIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Post,
    Comment,
    Observe,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub subject_id: String,
    pub title: String,
    pub content: String,
    pub outcome: ActivityOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub posts: usize,
    pub comments: usize,
    pub observations: usize,
    pub errors: usize,
    pub total: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Bounded, thread-safe, append-only log of engine actions. Clones share
/// the same underlying ring, so a cycle can write while another task reads.
#[derive(Clone)]
pub struct ActivityLedger {
    inner: Arc<RwLock<VecDeque<ActivityRecord>>>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(MAX_ACTIVITIES))),
        }
    }

    pub fn record_post(&self, subject_id: &str, title: &str, content: &str, success: bool) {
        self.push(ActivityRecord {
            kind: ActivityKind::Post,
            subject_id: subject_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            outcome: outcome(success),
            timestamp: Utc::now(),
        });
    }

    pub fn record_comment(&self, post_id: &str, post_title: &str, comment: &str, success: bool) {
        self.push(ActivityRecord {
            kind: ActivityKind::Comment,
            subject_id: post_id.to_string(),
            title: post_title.to_string(),
            content: comment.to_string(),
            outcome: outcome(success),
            timestamp: Utc::now(),
        });
    }

    pub fn record_observation(&self, post_id: &str, post_title: &str) {
        self.push(ActivityRecord {
            kind: ActivityKind::Observe,
            subject_id: post_id.to_string(),
            title: post_title.to_string(),
            content: "observed but took no action".to_string(),
            outcome: ActivityOutcome::Success,
            timestamp: Utc::now(),
        });
    }

    pub fn record_error(&self, message: &str) {
        self.push(ActivityRecord {
            kind: ActivityKind::Error,
            subject_id: String::new(),
            title: "error occurred".to_string(),
            content: message.to_string(),
            outcome: ActivityOutcome::Failure,
            timestamp: Utc::now(),
        });
    }

    // Append and eviction happen under one write guard, so readers never
    // observe a transient over-capacity ring.
    fn push(&self, record: ActivityRecord) {
        let mut ring = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        ring.push_front(record);
        ring.truncate(MAX_ACTIVITIES);
    }

    /// Recent activities, most recent first.
    pub fn recent(&self) -> Vec<ActivityRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .front()
            .map(|r| r.timestamp)
    }

    pub fn stats(&self) -> LedgerStats {
        let ring = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats = LedgerStats {
            total: ring.len(),
            last_activity: ring.front().map(|r| r.timestamp),
            ..LedgerStats::default()
        };
        for record in ring.iter() {
            match record.kind {
                ActivityKind::Post => stats.posts += 1,
                ActivityKind::Comment => stats.comments += 1,
                ActivityKind::Observe => stats.observations += 1,
                ActivityKind::Error => stats.errors += 1,
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn outcome(success: bool) -> ActivityOutcome {
    if success {
        ActivityOutcome::Success
    } else {
        ActivityOutcome::Failure
    }
}
