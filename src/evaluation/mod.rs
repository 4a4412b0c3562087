//! Submission text evaluation.
//!
//! - [`validation`]: cleaning, length bounds and blocked-content checks
//! - [`heuristic`]: deterministic local scorer
//! - [`classifier`]: sentiment, category and keyword tagging
//! - [`evaluator`]: remote scorer with timeout and heuristic fallback

pub mod classifier;
pub mod evaluator;
pub mod heuristic;
pub mod validation;

pub use classifier::{classify, Classification};
pub use evaluator::{RemoteScore, ScoringClient, TextEvaluator};
pub use heuristic::{HeuristicScorer, DEFAULT_TOPIC_WORDS};
pub use validation::{clean_text, extract_email, is_valid_email, TextPolicy};
