//! Core data types for the storygate intake gate
//!
//! These types flow between the evaluator, the tier assigner, the analytics
//! aggregator and the persisted document. Everything persisted derives serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    /// Create a new random submission ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    /// Remote scoring collaborator (hosted language model)
    Remote,
    /// Local heuristic scorer
    Fallback,
}

impl std::fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationSource::Remote => write!(f, "remote"),
            EvaluationSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of scoring a piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Quality score, always within 0..=10
    pub score: u8,

    /// Short explanation of the score
    pub rationale: String,

    pub source: EvaluationSource,
}

/// Overall tone of a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a submission is mostly about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Expectations,
    Logistics,
    Technical,
    Networking,
    Learning,
    #[default]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Expectations => "EXPECTATIONS",
            Category::Logistics => "LOGISTICS",
            Category::Technical => "TECHNICAL",
            Category::Networking => "NETWORKING",
            Category::Learning => "LEARNING",
            Category::General => "GENERAL",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier name plus the generated reward code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCode {
    pub tier_name: String,
    pub code: String,
}

/// An accepted submission
///
/// Created once per accepted submission and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub user_id: String,
    pub submitted_text: String,
    pub score: u8,
    pub tier: String,
    pub code: String,
    pub rationale: String,
    pub source: EvaluationSource,
    pub timestamp: DateTime<Utc>,

    /// E-mail address the reward was (or could be) sent to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_address: Option<String>,

    #[serde(default)]
    pub sentiment: Sentiment,

    #[serde(default)]
    pub category: Category,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl SubmissionRecord {
    /// Lower-cased e-mail domain of the contact address, if any
    pub fn contact_domain(&self) -> Option<String> {
        self.contact_address.as_deref().and_then(email_domain)
    }

    /// Length of the submitted text in characters
    pub fn text_length(&self) -> usize {
        self.submitted_text.chars().count()
    }
}

/// A vendor redeeming an issued reward code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub code: String,
    pub vendor_id: String,
    pub tier: String,
    pub redeemed_at: DateTime<Utc>,
}

/// Inbound "submit feedback/story" request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    pub text: String,

    #[serde(default)]
    pub contact_address: Option<String>,
}

impl SubmitRequest {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            contact_address: None,
        }
    }

    pub fn with_contact(mut self, address: impl Into<String>) -> Self {
        self.contact_address = Some(address.into());
        self
    }
}

/// Outcome of a submission, accepted or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub score: Option<u8>,
    pub tier: Option<String>,
    pub code: Option<String>,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// Submissions left in the user's current window
    pub remaining: u32,
}

impl SubmitResponse {
    /// Build a rejection response
    pub fn rejected(message: impl Into<String>, remaining: u32) -> Self {
        Self {
            accepted: false,
            score: None,
            tier: None,
            code: None,
            message: message.into(),
            rationale: None,
            remaining,
        }
    }
}

/// Short stable hash of a user identifier (first 8 hex chars of SHA-256)
///
/// Analytics buckets users by this hash rather than by raw identifier.
pub fn user_hash(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    digest
        .iter()
        .take(4)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Lower-cased domain part of an e-mail address (text after the last `@`)
pub fn email_domain(address: &str) -> Option<String> {
    let (_, domain) = address.trim().rsplit_once('@')?;
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_lowercase())
}
