//! Static action policy: which named actions the agent may execute
//! autonomously, which are flagged for confirmation, and which are blocked
//! outright. The heartbeat loop consults this gate before every
//! side-effecting platform call; it must never execute a restricted action.

/// Action names used by the engine's own call sites.
pub const ACTION_CREATE_POST: &str = "create_post";
pub const ACTION_CREATE_COMMENT: &str = "create_comment";
pub const ACTION_UPVOTE: &str = "upvote_post";

/// Actions that must never run autonomously.
const RESTRICTED_ACTIONS: &[&str] = &[
    "delete_post",
    "create_submolt",
    "add_moderator",
    "authorize_payment",
    "confirm_order",
    "schedule_appointment",
];

/// Actions that run autonomously but are flagged for human review.
const CONFIRMATION_REQUIRED: &[&str] = &["create_post", "follow_agent", "subscribe_submolt"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub requires_confirmation: bool,
    pub reason: String,
}

impl PolicyDecision {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            requires_confirmation: false,
            reason: reason.into(),
        }
    }

    fn allow_flagged(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            requires_confirmation: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            requires_confirmation: false,
            reason: reason.into(),
        }
    }
}

/// Classify an action name. Anything absent from both sets is allowed.
pub fn validate(action: &str) -> PolicyDecision {
    if RESTRICTED_ACTIONS.contains(&action) {
        return PolicyDecision::deny(format!(
            "action '{action}' is restricted and cannot be executed autonomously"
        ));
    }
    if CONFIRMATION_REQUIRED.contains(&action) {
        return PolicyDecision::allow_flagged(format!(
            "action '{action}' requires human confirmation"
        ));
    }
    PolicyDecision::allow("action allowed")
}

pub fn is_allowed(action: &str) -> bool {
    !RESTRICTED_ACTIONS.contains(&action)
}

pub fn requires_confirmation(action: &str) -> bool {
    CONFIRMATION_REQUIRED.contains(&action)
}

pub fn restricted_actions() -> &'static [&'static str] {
    RESTRICTED_ACTIONS
}

pub fn confirmation_actions() -> &'static [&'static str] {
    CONFIRMATION_REQUIRED
}
