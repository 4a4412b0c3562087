//! LLM-backed story scoring
//!
//! Asks Claude Haiku to rate a submission on a 0-10 scale and explain the
//! rating in one sentence. The response is a fixed two-line format that is
//! parsed field by field.

use crate::config::EvaluatorConfig;
use crate::error::{GateError, Result};
use crate::evaluation::{RemoteScore, ScoringClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::debug;

/// Configuration for the LLM scorer
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Anthropic API key
    pub api_key: String,

    /// Model to use (default: claude-3-5-haiku-20241022)
    pub model: String,

    /// API base URL, without the `/v1/messages` path
    pub base_url: String,

    /// Max tokens for responses
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: "claude-3-5-haiku-20241022".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 256,
            temperature: 0.3,
        }
    }
}

impl From<&EvaluatorConfig> for LlmConfig {
    fn from(config: &EvaluatorConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Scores submissions through the Anthropic Messages API
pub struct LlmScoringClient {
    config: LlmConfig,
    client: reqwest::Client,
}

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    text: String,
}

impl LlmScoringClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(GateError::Config(config::ConfigError::Message(
                "ANTHROPIC_API_KEY not set".to_string(),
            )));
        }

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    pub fn with_default() -> Result<Self> {
        Self::new(LlmConfig::default())
    }

    fn build_prompt(text: &str) -> String {
        format!(
            r#"You are judging submissions to a hackathon feedback and story contest.

Rate this submission for creativity, specificity, relevance and effort.

Submission:
"""
{}
"""

Give a whole-number score from 0 (worthless) to 10 (outstanding) and one
sentence explaining it.

Format your response EXACTLY as:
SCORE: <0-10>
RATIONALE: <one sentence>
"#,
            text
        )
    }

    /// Parse the two-line SCORE/RATIONALE answer
    fn parse_response(response: &str) -> Result<RemoteScore> {
        let score_str = extract_field(response, "SCORE:")?;
        let rationale = extract_field(response, "RATIONALE:")?;

        // Tolerate "7/10" and trailing punctuation
        let digits: String = score_str
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '-')
            .collect();
        let score = digits.parse::<i32>().map_err(|_| {
            GateError::EvaluatorUnavailable(format!("Unparseable score: {}", score_str))
        })?;

        Ok(RemoteScore { score, rationale })
    }

    /// Make an API call to Claude
    async fn call_api(&self, prompt: &str) -> Result<String> {
        debug!("Calling Anthropic API");

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GateError::EvaluatorUnavailable(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            GateError::EvaluatorUnavailable(format!("Failed to parse response: {}", e))
        })?;

        api_response
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| GateError::EvaluatorUnavailable("Empty response from API".to_string()))
    }
}

#[async_trait]
impl ScoringClient for LlmScoringClient {
    async fn score(&self, text: &str) -> Result<RemoteScore> {
        let response = self.call_api(&Self::build_prompt(text)).await?;
        Self::parse_response(&response)
    }
}

/// Extract a field from structured LLM response
fn extract_field(response: &str, field: &str) -> Result<String> {
    response
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(field))
        .and_then(|line| line.strip_prefix(field))
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            GateError::EvaluatorUnavailable(format!("Failed to extract field: {}", field))
        })
}
