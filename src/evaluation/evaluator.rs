//! Text evaluator: remote scorer with a local fallback

use super::heuristic::HeuristicScorer;
use super::validation::TextPolicy;
use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::services::llm::{LlmConfig, LlmScoringClient};
use crate::types::{Evaluation, EvaluationSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw answer from a remote scorer, before range checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScore {
    pub score: i32,
    pub rationale: String,
}

/// Remote text-scoring collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Score already-cleaned text
    async fn score(&self, text: &str) -> Result<RemoteScore>;
}

/// Maps text to a score in 0..=10 plus a rationale
///
/// Text is validated first. Valid text goes to the remote scorer when one is
/// configured; any failure there (error, timeout, score outside 0..=10,
/// empty rationale) falls back to [`HeuristicScorer`], so a valid submission
/// always receives a score.
pub struct TextEvaluator {
    policy: TextPolicy,
    heuristic: HeuristicScorer,
    client: Option<Arc<dyn ScoringClient>>,
    timeout: Duration,
}

impl TextEvaluator {
    pub fn new(
        policy: TextPolicy,
        heuristic: HeuristicScorer,
        client: Option<Arc<dyn ScoringClient>>,
        timeout: Duration,
    ) -> Self {
        Self {
            policy,
            heuristic,
            client,
            timeout,
        }
    }

    /// Build from configuration, wiring the Anthropic scorer when enabled
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let policy = TextPolicy::from_limits(&config.limits)?;
        let heuristic = HeuristicScorer::new(config.evaluator.topic_words.clone());

        let client: Option<Arc<dyn ScoringClient>> = if !config.evaluator.enabled {
            info!("Remote scorer disabled, using heuristic scoring only");
            None
        } else if config.evaluator.api_key.is_empty() {
            warn!("ANTHROPIC_API_KEY not set, using heuristic scoring only");
            None
        } else {
            let llm = LlmScoringClient::new(LlmConfig::from(&config.evaluator))?;
            Some(Arc::new(llm))
        };

        Ok(Self::new(policy, heuristic, client, config.evaluator.timeout))
    }

    pub fn has_remote(&self) -> bool {
        self.client.is_some()
    }

    /// Clean and check `raw`; returns the cleaned text
    pub fn validate(&self, raw: &str) -> Result<String> {
        self.policy.validate(raw)
    }

    /// Validate then score
    pub async fn evaluate(&self, raw: &str) -> Result<Evaluation> {
        let text = self.validate(raw)?;
        Ok(self.score_cleaned(&text).await)
    }

    /// Score text that has already passed [`validate`](Self::validate)
    pub async fn score_cleaned(&self, text: &str) -> Evaluation {
        let Some(client) = &self.client else {
            return self.heuristic.score(text);
        };

        match self.score_remote(client.as_ref(), text).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("Remote scoring failed, using fallback: {}", e);
                self.heuristic.score(text)
            }
        }
    }

    async fn score_remote(&self, client: &dyn ScoringClient, text: &str) -> Result<Evaluation> {
        let remote = tokio::time::timeout(self.timeout, client.score(text))
            .await
            .map_err(|_| {
                GateError::EvaluatorUnavailable(format!(
                    "no answer within {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        if !(0..=10).contains(&remote.score) {
            return Err(GateError::EvaluatorUnavailable(format!(
                "score {} out of range",
                remote.score
            )));
        }
        let rationale = remote.rationale.trim();
        if rationale.is_empty() {
            return Err(GateError::EvaluatorUnavailable("empty rationale".into()));
        }

        debug!("Remote score {}", remote.score);
        Ok(Evaluation {
            score: remote.score as u8,
            rationale: rationale.to_string(),
            source: EvaluationSource::Remote,
        })
    }
}
