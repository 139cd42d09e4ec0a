use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Runtime configuration, loaded from `~/.krill/config.toml`.
///
/// Secrets can be supplied by environment instead of the file:
/// `KRILL_API_KEY` (platform) and `KRILL_LLM_API_KEY` (generator) take
/// priority over the file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform API, e.g. `https://platform.example/api/v1`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default = "default_agent_description")]
    pub description: String,
    /// Community the capability announcement is posted to.
    #[serde(default = "default_submolt")]
    pub submolt: String,
    /// Case-insensitive keywords that make a feed item relevant.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Enumerable capability list; summaries feed generation prompts and
    /// the supplementary search query.
    #[serde(default)]
    pub capabilities: Vec<CapabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    pub name: String,
    #[serde(default)]
    pub summary: String,
}

fn default_agent_name() -> String {
    "krill".into()
}

fn default_agent_description() -> String {
    "A helpful autonomous agent".into()
}

fn default_submolt() -> String {
    "general".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            description: default_agent_description(),
            submolt: default_submolt(),
            keywords: Vec::new(),
            capabilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: u32,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Pause between successive outbound side effects within one cycle.
    #[serde(default = "default_action_delay_secs")]
    pub action_delay_secs: u64,
    #[serde(default = "default_post_cooldown_minutes")]
    pub post_cooldown_minutes: u64,
    #[serde(default = "default_comment_cooldown_seconds")]
    pub comment_cooldown_seconds: u64,
}

fn default_interval_minutes() -> u64 {
    5
}

fn default_feed_limit() -> u32 {
    50
}

fn default_search_limit() -> u32 {
    10
}

fn default_action_delay_secs() -> u64 {
    2
}

// New agents start with a conservative posting window; the platform's
// retry hints adjust it at runtime.
fn default_post_cooldown_minutes() -> u64 {
    120
}

fn default_comment_cooldown_seconds() -> u64 {
    20
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            feed_limit: default_feed_limit(),
            search_limit: default_search_limit(),
            action_delay_secs: default_action_delay_secs(),
            post_cooldown_minutes: default_post_cooldown_minutes(),
            comment_cooldown_seconds: default_comment_cooldown_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_generator_temperature")]
    pub temperature: f64,
}

fn default_generator_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_generator_model() -> String {
    "gpt-4o-mini".into()
}

fn default_generator_temperature() -> f64 {
    0.7
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_generator_base_url(),
            api_key: None,
            model: default_generator_model(),
            temperature: default_generator_temperature(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            platform: PlatformConfig::default(),
            agent: AgentConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.krill/config.toml`, writing a default file on first run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        let krill_dir = home.join(".krill");
        if !krill_dir.exists() {
            fs::create_dir_all(&krill_dir)?;
        }

        let config_path = krill_dir.join("config.toml");
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Load and parse a specific config file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Load(e.to_string()))?;
        fs::write(&self.config_path, toml_str)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Env lookup is injected so tests don't mutate process environment.
    pub fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(key) = get("KRILL_API_KEY").filter(|k| !k.is_empty()) {
            self.platform.api_key = Some(key);
        }
        if let Some(key) = get("KRILL_LLM_API_KEY").filter(|k| !k.is_empty()) {
            self.generator.api_key = Some(key);
        }
    }

    /// Validate the parts every command needs before touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "platform.base_url is required (set it in config.toml)".into(),
            ));
        }
        Url::parse(&self.platform.base_url).map_err(|e| {
            ConfigError::Validation(format!("platform.base_url is not a valid URL: {e}"))
        })?;
        Url::parse(&self.generator.base_url).map_err(|e| {
            ConfigError::Validation(format!("generator.base_url is not a valid URL: {e}"))
        })?;
        if self.heartbeat.interval_minutes == 0 {
            return Err(ConfigError::Validation(
                "heartbeat.interval_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
