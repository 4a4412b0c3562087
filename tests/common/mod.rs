//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storygate_core::{
    config::TierConfig,
    error::{GateError, Result},
    DocumentBackend, GateConfig, GateDocument, HeuristicScorer, IntakeGate, MemoryStore,
    RemoteScore, ScoringClient, TextEvaluator, TextPolicy,
};

mock! {
    pub Scorer {}

    #[async_trait]
    impl ScoringClient for Scorer {
        async fn score(&self, text: &str) -> Result<RemoteScore>;
    }
}

/// Scorer that answers only after `delay`
pub struct SlowScorer {
    pub delay: Duration,
}

#[async_trait]
impl ScoringClient for SlowScorer {
    async fn score(&self, _text: &str) -> Result<RemoteScore> {
        tokio::time::sleep(self.delay).await;
        Ok(RemoteScore {
            score: 10,
            rationale: "late".to_string(),
        })
    }
}

/// Memory backend that fails selected saves (0-based save index)
pub struct FailingBackend {
    inner: MemoryStore,
    saves: AtomicUsize,
    fail_on: Mutex<HashSet<usize>>,
    fail_all: std::sync::atomic::AtomicBool,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            saves: AtomicUsize::new(0),
            fail_on: Mutex::new(HashSet::new()),
            fail_all: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Fail the save that is `offset` saves from now (0 = the next one)
    pub fn fail_save_in(&self, offset: usize) {
        let next = self.saves.load(Ordering::SeqCst);
        self.fail_on.lock().unwrap().insert(next + offset);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub async fn stored(&self) -> Option<GateDocument> {
        self.inner.load().await.unwrap()
    }
}

#[async_trait]
impl DocumentBackend for FailingBackend {
    async fn load(&self) -> Result<Option<GateDocument>> {
        self.inner.load().await
    }

    async fn save(&self, document: &GateDocument) -> Result<()> {
        let index = self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) || self.fail_on.lock().unwrap().contains(&index) {
            return Err(GateError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(document).await
    }

    fn describe(&self) -> String {
        "failing-memory".to_string()
    }
}

/// Limit 3 per 24h, tiers {9: PREMIUM, 6: STANDARD, 0: BASIC}
pub fn scenario_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.limits.max_requests_per_user = 3;
    config.limits.window = Duration::from_secs(24 * 3600);
    config.evaluator.enabled = false;
    config.tiers = vec![
        tier("PREMIUM", 9),
        tier("STANDARD", 6),
        tier("BASIC", 0),
    ];
    config
}

fn tier(name: &str, min_score: u8) -> TierConfig {
    TierConfig {
        name: name.to_string(),
        min_score,
        description: format!("{} reward", name.to_lowercase()),
    }
}

pub fn evaluator(
    config: &GateConfig,
    client: Option<Arc<dyn ScoringClient>>,
    timeout: Duration,
) -> TextEvaluator {
    TextEvaluator::new(
        TextPolicy::from_limits(&config.limits).expect("Failed to build text policy"),
        HeuristicScorer::new(config.evaluator.topic_words.clone()),
        client,
        timeout,
    )
}

/// Gate over `backend` with an optional remote scorer and no mailer
pub async fn create_test_gate(
    backend: Arc<dyn DocumentBackend>,
    client: Option<Arc<dyn ScoringClient>>,
) -> IntakeGate {
    let config = scenario_config();
    let evaluator = evaluator(&config, client, Duration::from_millis(200));
    IntakeGate::with_parts(config, backend, evaluator, None)
        .await
        .expect("Failed to open test gate")
}

/// Scorer mock answering with `scores` in order
pub fn scripted_scorer(scores: Vec<i32>) -> MockScorer {
    let mut mock = MockScorer::new();
    let mut remaining = scores.into_iter();
    mock.expect_score().returning(move |_| {
        let score = remaining.next().expect("scorer called more often than scripted");
        Ok(RemoteScore {
            score,
            rationale: format!("Scored {}", score),
        })
    });
    mock
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 15, 18, 30, 0).unwrap()
}

/// Exactly 25 characters
pub const SHORT_STORY: &str = "Pizza night was the best!";

pub const LONG_STORY: &str = "We debugged until 2am and the pepperoni pizza arrived just \
    as the demo finally worked. Honestly an epic, crazy night!";
