//! Error types for the storygate intake gate
//!
//! Structured error definitions use thiserror; anyhow errors coming from
//! outer layers are folded into [`GateError::Other`].

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for storygate operations
#[derive(Error, Debug)]
pub enum GateError {
    /// Submitted text is too short, too long, or contains blocked content
    #[error("Validation error: {0}")]
    Validation(String),

    /// The user has used every slot in the current window
    #[error("Rate limit exceeded ({remaining} remaining), retry after {retry_after}")]
    RateLimited {
        remaining: u32,
        retry_after: DateTime<Utc>,
    },

    /// The remote scoring collaborator failed or timed out
    #[error("Evaluator unavailable: {0}")]
    EvaluatorUnavailable(String),

    /// The durable document could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reward code does not match the expected layout
    #[error("Invalid reward code: {0}")]
    InvalidCode(String),

    /// Reward code was never issued by this gate
    #[error("Unknown reward code: {0}")]
    UnknownCode(String),

    /// Reward code has already been redeemed
    #[error("Reward code already redeemed: {0}")]
    AlreadyRedeemed(String),

    /// Mail dispatch failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl GateError {
    /// Whether the caller may retry the same submission later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GateError::RateLimited { .. } | GateError::Persistence(_)
        )
    }
}

/// Result type alias for storygate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Convert anyhow::Error to GateError
impl From<anyhow::Error> for GateError {
    fn from(err: anyhow::Error) -> Self {
        GateError::Other(err.to_string())
    }
}
