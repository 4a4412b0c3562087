//! The intake gate: one request/response `submit` operation
//!
//! A submission goes through these steps:
//!
//! 1. the user id, contact address and text are validated (failures are not
//!    counted as requests)
//! 2. one store transaction counts the request and reserves a rate-limit
//!    slot; a rejected user gets [`GateError::RateLimited`]
//! 3. the text is scored outside the store lock
//! 4. a tier and code are assigned, and the text is tagged with a sentiment,
//!    a category and keywords
//! 5. a second transaction appends the submission; if that cannot be
//!    persisted the reserved slot is handed back
//! 6. the reward code is mailed to the contact address, if any
//!
//! Vendors redeem issued codes through [`IntakeGate::redeem`].

use crate::analytics::{render_report, AnalyticsAggregator, AnalyticsSummary};
use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::evaluation::{classify, extract_email, is_valid_email, TextEvaluator};
use crate::notify::{mailer_from_config, reward_message, Mailer};
use crate::rate_limiter::RateLimiter;
use crate::rewards::RewardTierAssigner;
use crate::storage::{CounterStore, DocumentBackend, JsonFileStore};
use crate::types::{Redemption, SubmissionId, SubmissionRecord, SubmitRequest, SubmitResponse};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct IntakeGate {
    config: GateConfig,
    store: Arc<CounterStore>,
    limiter: RateLimiter,
    evaluator: TextEvaluator,
    assigner: RewardTierAssigner,
    analytics: AnalyticsAggregator,
    mailer: Option<Arc<dyn Mailer>>,
}

impl IntakeGate {
    /// Open the gate described by `config`: JSON document store, remote
    /// scorer when an API key is available, mailer when enabled
    pub async fn open(config: GateConfig) -> Result<Self> {
        let backend = Arc::new(JsonFileStore::new(&config.storage.path));
        let evaluator = TextEvaluator::from_config(&config)?;
        let mailer = mailer_from_config(&config.notify)?;
        Self::with_parts(config, backend, evaluator, mailer).await
    }

    /// Open with explicit collaborators
    pub async fn with_parts(
        config: GateConfig,
        backend: Arc<dyn DocumentBackend>,
        evaluator: TextEvaluator,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(CounterStore::open(backend).await?);
        let limiter = RateLimiter::new(config.limits.max_requests_per_user, config.limits.window);
        let assigner = RewardTierAssigner::new(
            config.tier_thresholds()?,
            config.event.code_prefix.clone(),
            config.event.event_id.clone(),
        );

        let issued: Vec<String> = store
            .read(|doc| doc.issued_codes().map(String::from).collect())
            .await;
        debug!("Remembering {} issued codes", issued.len());
        assigner.remember_issued(issued);

        info!(
            "Intake gate open for {} (store: {}, remote scorer: {})",
            config.event.name,
            store.describe(),
            evaluator.has_remote()
        );

        Ok(Self {
            analytics: AnalyticsAggregator::new(store.clone()),
            config,
            store,
            limiter,
            evaluator,
            assigner,
            mailer,
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse> {
        self.submit_at(request, Utc::now()).await
    }

    /// Run a submission as if it arrived at `now`
    pub async fn submit_at(
        &self,
        request: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmitResponse> {
        let user_id = request.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(GateError::Validation("user id cannot be empty".into()));
        }
        let contact = resolve_contact(&request)?;
        let text = self.evaluator.validate(&request.text)?;

        let decision = self
            .store
            .transact(|doc| {
                self.limiter.prune(&mut doc.rate_limits, now);
                doc.analytics.record_request(&user_id, now);
                Ok(self.limiter.allow(&mut doc.rate_limits, &user_id, now))
            })
            .await?;

        if !decision.accepted {
            info!("Rate limited submission");
            return Err(GateError::RateLimited {
                remaining: 0,
                retry_after: decision.retry_after.unwrap_or(now),
            });
        }

        let evaluation = self.evaluator.score_cleaned(&text).await;
        let reward = self.assigner.assign_tier(evaluation.score, &user_id, now);
        let tags = classify(&text);

        let record = SubmissionRecord {
            id: SubmissionId::new(),
            user_id: user_id.clone(),
            submitted_text: text,
            score: evaluation.score,
            tier: reward.tier_name.clone(),
            code: reward.code.clone(),
            rationale: evaluation.rationale.clone(),
            source: evaluation.source,
            timestamp: now,
            contact_address: contact,
            sentiment: tags.sentiment,
            category: tags.category,
            keywords: tags.keywords,
        };

        if let Err(e) = self.analytics.record(record.clone()).await {
            self.release_slot(&user_id, now).await;
            return Err(e);
        }

        info!(
            "Accepted submission {}: {} ({}/10, {}, {} {})",
            record.id, record.tier, record.score, record.source, record.category, record.sentiment
        );

        self.notify(&record).await;

        Ok(SubmitResponse {
            accepted: true,
            score: Some(record.score),
            tier: Some(record.tier),
            code: Some(record.code),
            message: format!(
                "Thanks! Your submission scored {}/10 and earned a {} reward.",
                evaluation.score, reward.tier_name
            ),
            rationale: Some(evaluation.rationale),
            remaining: decision.remaining,
        })
    }

    /// Like [`submit`](Self::submit) but every failure becomes a rejection response
    pub async fn handle(&self, request: SubmitRequest) -> SubmitResponse {
        let user_id = request.user_id.trim().to_string();
        let now = Utc::now();
        match self.submit_at(request, now).await {
            Ok(response) => response,
            Err(e) => self.rejection(&user_id, &e, now).await,
        }
    }

    /// Rejection response for a submission by `user_id` that failed at `now`
    pub async fn rejection(
        &self,
        user_id: &str,
        error: &GateError,
        now: DateTime<Utc>,
    ) -> SubmitResponse {
        match error {
            GateError::RateLimited { retry_after, .. } => SubmitResponse::rejected(
                format!(
                    "Rate limit exceeded. You can submit again after {}.",
                    retry_after.format("%Y-%m-%d %H:%M UTC")
                ),
                0,
            ),
            GateError::Validation(message) => {
                SubmitResponse::rejected(message.clone(), self.remaining_at(user_id, now).await)
            }
            e => {
                warn!("Submission failed: {}", e);
                SubmitResponse::rejected(
                    "Your submission could not be saved, please try again.",
                    self.remaining_at(user_id, now).await,
                )
            }
        }
    }

    /// Submissions `user_id` may still make in the current window
    pub async fn remaining(&self, user_id: &str) -> u32 {
        self.remaining_at(user_id, Utc::now()).await
    }

    /// Submissions `user_id` may still make in the window ending at `now`
    pub async fn remaining_at(&self, user_id: &str, now: DateTime<Utc>) -> u32 {
        self.store
            .read(|doc| self.limiter.remaining(&doc.rate_limits, user_id, now))
            .await
    }

    pub async fn summary(&self) -> AnalyticsSummary {
        self.analytics.summary().await
    }

    /// Human-readable analytics report
    pub async fn report(&self) -> String {
        render_report(&self.config.event.name, &self.summary().await)
    }

    pub async fn submissions(&self) -> Vec<SubmissionRecord> {
        self.analytics.submissions().await
    }

    pub async fn redeem(&self, code: &str, vendor_id: &str) -> Result<Redemption> {
        self.redeem_at(code, vendor_id, Utc::now()).await
    }

    /// Mark an issued code as used; each code can be redeemed once
    pub async fn redeem_at(
        &self,
        code: &str,
        vendor_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption> {
        let code = code.trim();
        let vendor_id = vendor_id.trim();
        if vendor_id.is_empty() {
            return Err(GateError::Validation("vendor id cannot be empty".into()));
        }
        self.assigner.parse_code(code)?;

        let redemption = self
            .store
            .transact(|doc| {
                let tier = doc
                    .find_submission(code)
                    .map(|r| r.tier.clone())
                    .ok_or_else(|| GateError::UnknownCode(code.to_string()))?;
                if doc.is_redeemed(code) {
                    return Err(GateError::AlreadyRedeemed(code.to_string()));
                }

                let redemption = Redemption {
                    code: code.to_string(),
                    vendor_id: vendor_id.to_string(),
                    tier,
                    redeemed_at: now,
                };
                doc.redemptions.push(redemption.clone());
                Ok(redemption)
            })
            .await?;

        info!("Redeemed {} code at vendor {}", redemption.tier, vendor_id);
        Ok(redemption)
    }

    async fn release_slot(&self, user_id: &str, at: DateTime<Utc>) {
        let released = self
            .store
            .transact(|doc| Ok(self.limiter.release(&mut doc.rate_limits, user_id, at)))
            .await;
        match released {
            Ok(true) => debug!("Released rate-limit slot after failed save"),
            Ok(false) => {}
            Err(e) => warn!("Could not release rate-limit slot: {}", e),
        }
    }

    async fn notify(&self, record: &SubmissionRecord) {
        let (Some(mailer), Some(to)) = (&self.mailer, record.contact_address.as_deref()) else {
            return;
        };

        let description = self.assigner.thresholds().description(&record.tier);
        let (subject, body) = reward_message(&self.config.event.name, record, description);
        match mailer.send(to, &subject, &body).await {
            Ok(()) => debug!("Reward code mailed"),
            Err(e) => warn!("Failed to mail reward code: {}", e),
        }
    }
}

/// Explicit contact address, else the first address mentioned in the text
fn resolve_contact(request: &SubmitRequest) -> Result<Option<String>> {
    match request.contact_address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => {
            if !is_valid_email(address) {
                return Err(GateError::Validation(format!(
                    "invalid contact address: {}",
                    address
                )));
            }
            Ok(Some(address.to_string()))
        }
        _ => Ok(extract_email(&request.text)),
    }
}
