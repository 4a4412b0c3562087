//! Storygate - Feedback and Story Intake Gate
//!
//! Users submit free-form feedback or a short story; the gate:
//! - validates and rate-limits the submission per user (sliding window)
//! - scores the text with a hosted LLM, falling back to a local heuristic
//! - tags the text with a sentiment, a category and keywords
//! - maps the score to a reward tier and mints a unique reward code
//! - keeps rolling analytics and the submission log in one durable document
//!
//! # Architecture
//!
//! - **Types**: Core data structures (SubmissionRecord, Evaluation, ...)
//! - **Storage**: Counter store over a pluggable document backend
//! - **Evaluation**: Validation, heuristic scorer, remote-scorer fallback
//! - **Rewards / Rate limiter / Analytics**: the gate's components
//! - **Gate**: the `submit` request/response operation
//! - **API**: axum HTTP interface
//!
//! # Example
//!
//! ```ignore
//! use storygate_core::{GateConfig, IntakeGate, SubmitRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GateConfig::load(None)?;
//!     let gate = IntakeGate::open(config).await?;
//!
//!     let response = gate
//!         .submit(SubmitRequest::new("alice", "The midnight pizza saved our demo!"))
//!         .await?;
//!     println!("{} -> {:?}", response.message, response.code);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod gate;
pub mod notify;
pub mod rate_limiter;
pub mod rewards;
pub mod services;
pub mod storage;
pub mod types;

pub use analytics::{AnalyticsAggregator, AnalyticsSnapshot, AnalyticsSummary, ExportFormat};
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use evaluation::{
    classify, Classification, HeuristicScorer, RemoteScore, ScoringClient, TextEvaluator,
    TextPolicy,
};
pub use gate::IntakeGate;
pub use notify::{HttpMailer, LogMailer, Mailer};
pub use rate_limiter::{RateDecision, RateLimiter, UserRateState};
pub use rewards::{RewardTierAssigner, TierThreshold, TierThresholds};
pub use services::{LlmConfig, LlmScoringClient};
pub use storage::{CounterStore, DocumentBackend, GateDocument, JsonFileStore, MemoryStore};
pub use types::{
    Category, Evaluation, EvaluationSource, Redemption, RewardCode, Sentiment, SubmissionId,
    SubmissionRecord, SubmitRequest, SubmitResponse,
};
