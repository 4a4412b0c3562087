//! Services layer for storygate
//!
//! Provides the hosted-LLM scoring integration.

pub mod llm;

pub use llm::{LlmConfig, LlmScoringClient};
