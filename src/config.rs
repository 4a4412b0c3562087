//! Gate configuration
//!
//! Every component receives its settings from [`GateConfig`] at construction.
//! Sources are layered: built-in defaults, then an optional TOML file, then
//! `STORYGATE_*` environment variables (`__` separates nested keys, e.g.
//! `STORYGATE_LIMITS__MAX_REQUESTS_PER_USER=5`).

use crate::error::{GateError, Result};
use crate::rewards::{TierThreshold, TierThresholds};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "STORYGATE";

/// Complete gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub event: EventConfig,
    pub limits: LimitsConfig,
    pub evaluator: EvaluatorConfig,
    pub tiers: Vec<TierConfig>,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub notify: NotifyConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            event: EventConfig::default(),
            limits: LimitsConfig::default(),
            evaluator: EvaluatorConfig::default(),
            tiers: default_tiers(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Event identity, baked into reward codes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Human-readable event name used in messages
    pub name: String,

    /// Short event identifier (alphanumeric)
    pub event_id: String,

    /// First segment of every reward code
    pub code_prefix: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            name: "TechHack 2024".to_string(),
            event_id: "CONF24".to_string(),
            code_prefix: "PIZZA".to_string(),
        }
    }
}

/// Submission limits and content rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Accepted submissions per user per window
    pub max_requests_per_user: u32,

    /// Sliding window length (seconds in serialized form)
    #[serde(with = "serde_duration")]
    pub window: Duration,

    /// Minimum text length in characters
    pub min_text_length: usize,

    /// Maximum text length in characters
    pub max_text_length: usize,

    /// Words that reject a submission outright (case-insensitive)
    pub blocked_words: Vec<String>,

    /// Reject text containing URLs or long runs of one character
    pub spam_protection: bool,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests_per_user: 3,
            window: Duration::from_secs(24 * 3600),
            min_text_length: 20,
            max_text_length: 1000,
            blocked_words: vec!["spam".into(), "test123".into(), "asdf".into()],
            spam_protection: true,
        }
    }
}

/// Remote scoring collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Use the remote scorer at all; when false only the heuristic runs
    pub enabled: bool,

    /// Anthropic API key (never serialized; falls back to ANTHROPIC_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: String,

    pub model: String,
    pub base_url: String,
    pub max_tokens: usize,
    pub temperature: f32,

    /// Bound on a single remote scoring call (seconds in serialized form)
    #[serde(with = "serde_duration")]
    pub timeout: Duration,

    /// Subject words the heuristic scorer rewards
    pub topic_words: Vec<String>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: "claude-3-5-haiku-20241022".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 256,
            temperature: 0.3,
            timeout: Duration::from_secs(8),
            topic_words: crate::evaluation::heuristic::DEFAULT_TOPIC_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

/// One reward tier: name, minimum score, description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub min_score: u8,

    #[serde(default)]
    pub description: String,
}

/// Durable document location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
        }
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Reward mail dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,

    /// Log reward mails instead of sending them
    pub dry_run: bool,

    /// HTTP endpoint accepting `{to, from, subject, text}` JSON
    pub endpoint: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub from_address: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dry_run: false,
            endpoint: String::new(),
            api_key: env::var("STORYGATE_MAIL_API_KEY").unwrap_or_default(),
            from_address: "rewards@storygate.local".to_string(),
        }
    }
}

/// Default tiers: PREMIUM from 8, STANDARD from 6, BASIC for everything else
pub fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            name: "PREMIUM".to_string(),
            min_score: 8,
            description: "LARGE pizza with premium toppings".to_string(),
        },
        TierConfig {
            name: "STANDARD".to_string(),
            min_score: 6,
            description: "MEDIUM pizza with your choice of toppings".to_string(),
        },
        TierConfig {
            name: "BASIC".to_string(),
            min_score: 0,
            description: "REGULAR pizza".to_string(),
        },
    ]
}

/// Default document path under the local data directory
fn default_document_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storygate")
        .join("storygate.json")
}

impl GateConfig {
    /// Load layered configuration: defaults, optional TOML file, environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: GateConfig = builder.build()?.try_deserialize()?;
        config.fill_api_key_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment layering)
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let mut config: GateConfig = toml::from_str(toml_str)?;
        config.fill_api_key_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration (secrets omitted)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GateError::Other(e.to_string()))
    }

    fn fill_api_key_from_env(&mut self) {
        if self.evaluator.api_key.is_empty() {
            if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
                self.evaluator.api_key = key;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_requests_per_user == 0 {
            return Err(invalid("limits.max_requests_per_user must be at least 1"));
        }
        let max_window = Duration::from_secs(365 * 86400);
        if limits.window < Duration::from_secs(1) || limits.window > max_window {
            return Err(invalid("limits.window must be between 1 second and 365 days"));
        }
        if limits.min_text_length == 0 || limits.min_text_length > limits.max_text_length {
            return Err(invalid(
                "limits.min_text_length must be at least 1 and not exceed limits.max_text_length",
            ));
        }
        if self.evaluator.timeout.is_zero() || self.evaluator.timeout > Duration::from_secs(300) {
            return Err(invalid("evaluator.timeout must be between 1 and 300 seconds"));
        }
        if !is_code_segment(&self.event.event_id) || !is_code_segment(&self.event.code_prefix) {
            return Err(invalid(
                "event.event_id and event.code_prefix must be non-empty and alphanumeric",
            ));
        }
        if self.notify.enabled && !self.notify.dry_run && self.notify.endpoint.is_empty() {
            return Err(invalid(
                "notify.endpoint is required when notify.enabled is set without notify.dry_run",
            ));
        }

        // Builds and checks ordering/uniqueness
        self.tier_thresholds()?;
        Ok(())
    }

    /// Tier thresholds, sorted highest-to-lowest
    pub fn tier_thresholds(&self) -> Result<TierThresholds> {
        if self.tiers.is_empty() {
            return Err(invalid("at least one tier is required"));
        }
        let tiers = self.tiers.clone();

        let mut names = HashSet::new();
        for tier in &tiers {
            if !is_code_segment(&tier.name) {
                return Err(invalid(format!(
                    "tier name '{}' must be non-empty and alphanumeric",
                    tier.name
                )));
            }
            if !names.insert(tier.name.clone()) {
                return Err(invalid(format!("duplicate tier name '{}'", tier.name)));
            }
        }

        TierThresholds::new(
            tiers
                .into_iter()
                .map(|t| TierThreshold {
                    min_score: t.min_score,
                    tier_name: t.name,
                    description: t.description,
                })
                .collect(),
        )
    }
}

fn is_code_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

pub(crate) fn invalid(msg: impl Into<String>) -> GateError {
    GateError::Config(config::ConfigError::Message(msg.into()))
}

// Serialize/deserialize Duration as whole seconds
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
