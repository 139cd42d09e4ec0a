use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `krill`.
///
/// Each subsystem defines its own error variant. The engine matches on
/// [`PlatformError`] to decide recovery strategy; orchestration code uses
/// `anyhow::Result` for ad-hoc context chains and converts at the boundary.
#[derive(Debug, Error)]
pub enum KrillError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Platform API ────────────────────────────────────────────────────
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Platform API errors ────────────────────────────────────────────────────

/// Errors from the remote platform, classified so the engine can branch:
/// auth failures trigger the public-feed fallback, rate limits feed the
/// cooldown controller, everything else fails the cycle.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("authentication required: {0}")]
    Auth(String),

    #[error("rate limited: {body}")]
    RateLimited { body: String },

    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

impl PlatformError {
    /// True for 401/403-class failures (e.g. the personalized feed before
    /// any subscriptions exist).
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// True when the platform asked us to back off.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The raw error payload, when the platform sent one. Rate-limit bodies
    /// carry the retry hints the cooldown controller parses.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::RateLimited { body } | Self::Api { body, .. } => Some(body),
            Self::Auth(body) => Some(body),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, KrillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = KrillError::Config(ConfigError::Validation("missing base_url".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn rate_limited_exposes_body() {
        let err = PlatformError::RateLimited {
            body: r#"{"retry_after_seconds":45}"#.into(),
        };
        assert!(err.is_rate_limit());
        assert!(err.body().unwrap().contains("45"));
    }

    #[test]
    fn auth_classification() {
        let err = PlatformError::Auth("Authentication required".into());
        assert!(err.is_auth());
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let err: KrillError = anyhow_err.into();
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn api_error_displays_status() {
        let err = PlatformError::Api {
            status: 500,
            body: "internal".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.body().is_some());
    }
}
