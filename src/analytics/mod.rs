//! Analytics aggregation
//!
//! [`AnalyticsSnapshot`] holds counters that are only ever advanced by
//! [`record_request`](AnalyticsSnapshot::record_request) and
//! [`record`](AnalyticsSnapshot::record); [`AnalyticsSummary`] is computed
//! from a snapshot on demand. The snapshot is persisted inside the gate
//! document, so it survives restarts.

pub mod export;
pub mod report;

pub use export::{write_submissions, ExportFormat};
pub use report::render_report;

use crate::error::Result;
use crate::storage::CounterStore;
use crate::types::{user_hash, SubmissionRecord};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How many entries the "top" lists of a summary keep
const TOP_N: usize = 5;

/// Incrementally maintained counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    /// Attempts that passed validation, accepted or rate-limited
    pub total_requests: u64,

    /// Reward codes issued
    pub total_issued: u64,

    pub per_tier_counts: BTreeMap<String, u64>,

    /// Requests by UTC hour of day (0-23)
    pub per_hour_counts: BTreeMap<u32, u64>,

    /// Requests by UTC date (YYYY-MM-DD)
    pub per_day_counts: BTreeMap<String, u64>,

    /// Issued codes by contact e-mail domain
    pub per_domain_counts: BTreeMap<String, u64>,

    /// Issued codes by feedback category
    pub per_category_counts: BTreeMap<String, u64>,

    /// Issued codes by sentiment
    pub per_sentiment_counts: BTreeMap<String, u64>,

    /// Requests by hashed user id
    pub per_user_requests: BTreeMap<String, u64>,

    pub score_sum: u64,
    pub score_count: u64,
    pub text_length_sum: u64,

    pub started_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl AnalyticsSnapshot {
    /// Count one submission attempt
    pub fn record_request(&mut self, user_id: &str, at: DateTime<Utc>) {
        self.total_requests += 1;
        *self.per_hour_counts.entry(at.hour()).or_default() += 1;
        *self
            .per_day_counts
            .entry(at.format("%Y-%m-%d").to_string())
            .or_default() += 1;
        *self.per_user_requests.entry(user_hash(user_id)).or_default() += 1;
        self.touch(at);
    }

    /// Fold in one accepted submission
    pub fn record(&mut self, submission: &SubmissionRecord) {
        self.total_issued += 1;
        // A submission recorded without a matching request still counts as one
        self.total_requests = self.total_requests.max(self.total_issued);

        *self
            .per_tier_counts
            .entry(submission.tier.clone())
            .or_default() += 1;
        if let Some(domain) = submission.contact_domain() {
            *self.per_domain_counts.entry(domain).or_default() += 1;
        }
        *self
            .per_category_counts
            .entry(submission.category.to_string())
            .or_default() += 1;
        *self
            .per_sentiment_counts
            .entry(submission.sentiment.to_string())
            .or_default() += 1;

        self.score_sum += u64::from(submission.score);
        self.score_count += 1;
        self.text_length_sum += submission.text_length() as u64;
        self.touch(submission.timestamp);
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        if self.started_at.map_or(true, |s| at < s) {
            self.started_at = Some(at);
        }
        if self.last_updated.map_or(true, |l| at > l) {
            self.last_updated = Some(at);
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        (self.total_issued as f64 / self.total_requests as f64).min(1.0)
    }

    pub fn average_score(&self) -> f64 {
        if self.score_count == 0 {
            return 0.0;
        }
        self.score_sum as f64 / self.score_count as f64
    }

    pub fn average_text_length(&self) -> f64 {
        if self.score_count == 0 {
            return 0.0;
        }
        self.text_length_sum as f64 / self.score_count as f64
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            conversion_rate: self.conversion_rate(),
            average_score: self.average_score(),
            average_text_length: self.average_text_length(),
            unique_users: self.per_user_requests.len(),
            top_hours: top_n(&self.per_hour_counts),
            top_domains: top_n(&self.per_domain_counts),
            snapshot: self.clone(),
        }
    }
}

/// Snapshot plus derived figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// `total_issued / total_requests`, 0 without requests
    pub conversion_rate: f64,

    /// `score_sum / score_count`, 0 without scores
    pub average_score: f64,

    pub average_text_length: f64,
    pub unique_users: usize,

    /// Busiest hours, most requests first
    pub top_hours: Vec<(u32, u64)>,

    /// Most common contact domains, most codes first
    pub top_domains: Vec<(String, u64)>,

    pub snapshot: AnalyticsSnapshot,
}

fn top_n<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> Vec<(K, u64)> {
    let mut entries: Vec<(K, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // Stable sort keeps ties in key order
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(TOP_N);
    entries
}

/// Analytics view over the counter store
#[derive(Clone)]
pub struct AnalyticsAggregator {
    store: Arc<CounterStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Append an accepted submission to the log and counters, then persist
    pub async fn record(&self, submission: SubmissionRecord) -> Result<()> {
        self.store
            .transact(move |doc| {
                doc.record_submission(submission);
                Ok(())
            })
            .await
    }

    pub async fn summary(&self) -> AnalyticsSummary {
        self.store.read(|doc| doc.analytics.summary()).await
    }

    pub async fn submissions(&self) -> Vec<SubmissionRecord> {
        self.store.read(|doc| doc.requests.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, EvaluationSource, Sentiment, SubmissionId};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn submission(tier: &str, score: u8, contact: Option<&str>, hour: u32) -> SubmissionRecord {
        SubmissionRecord {
            id: SubmissionId::new(),
            user_id: "alice".into(),
            submitted_text: "x".repeat(40),
            score,
            tier: tier.into(),
            code: format!("C-{}-{}", tier, score),
            rationale: "r".into(),
            source: EvaluationSource::Remote,
            timestamp: Utc.with_ymd_and_hms(2024, 12, 1, hour, 0, 0).unwrap(),
            contact_address: contact.map(String::from),
            sentiment: if score >= 6 {
                Sentiment::Positive
            } else {
                Sentiment::Neutral
            },
            category: Category::General,
            keywords: Vec::new(),
        }
    }

    #[test]
    fn test_empty_snapshot_summary() {
        let summary = AnalyticsSnapshot::default().summary();
        assert_eq!(summary.conversion_rate, 0.0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.top_hours.is_empty());
    }

    #[test]
    fn test_record_updates_counters() {
        let mut snap = AnalyticsSnapshot::default();
        let at = Utc.with_ymd_and_hms(2024, 12, 1, 14, 30, 0).unwrap();
        for user in ["alice", "bob", "alice", "carol"] {
            snap.record_request(user, at);
        }
        snap.record(&submission("PREMIUM", 9, Some("a@Uni.edu"), 14));
        snap.record(&submission("BASIC", 3, None, 14));

        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.total_issued, 2);
        assert_eq!(snap.per_tier_counts["PREMIUM"], 1);
        assert_eq!(snap.per_tier_counts["BASIC"], 1);
        assert_eq!(snap.per_hour_counts[&14], 4);
        assert_eq!(snap.per_day_counts["2024-12-01"], 4);
        assert_eq!(snap.per_domain_counts["uni.edu"], 1);
        assert_eq!(snap.per_category_counts["GENERAL"], 2);
        assert_eq!(snap.per_sentiment_counts["positive"], 1);
        assert_eq!(snap.per_sentiment_counts["neutral"], 1);

        let summary = snap.summary();
        assert_eq!(summary.conversion_rate, 0.5);
        assert_eq!(summary.average_score, 6.0);
        assert_eq!(summary.average_text_length, 40.0);
        assert_eq!(summary.unique_users, 3);
    }

    #[test]
    fn test_top_n_orders_by_count() {
        let mut counts = BTreeMap::new();
        counts.insert("b.io".to_string(), 3);
        counts.insert("a.io".to_string(), 3);
        counts.insert("c.io".to_string(), 7);
        let top = top_n(&counts);
        assert_eq!(top[0], ("c.io".to_string(), 7));
        assert_eq!(top[1].0, "a.io");
    }

    #[test]
    fn test_snapshot_json_keeps_hour_keys() {
        let mut snap = AnalyticsSnapshot::default();
        snap.record_request("u", Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap());
        let json = serde_json::to_string(&snap).unwrap();
        let back: AnalyticsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(
            events in proptest::collection::vec((any::<bool>(), 0u8..=10, 0u32..24), 0..80)
        ) {
            let mut snap = AnalyticsSnapshot::default();
            for (issue, score, hour) in events {
                let at = Utc.with_ymd_and_hms(2024, 12, 1, hour, 0, 0).unwrap();
                snap.record_request("user", at);
                if issue {
                    let tier = if score >= 6 { "HIGH" } else { "LOW" };
                    snap.record(&submission(tier, score, None, hour));
                }
            }
            let rate = snap.conversion_rate();
            prop_assert!((0.0..=1.0).contains(&rate));
            prop_assert!(snap.total_issued <= snap.total_requests);
            prop_assert_eq!(snap.per_tier_counts.values().sum::<u64>(), snap.total_issued);
            prop_assert_eq!(snap.per_category_counts.values().sum::<u64>(), snap.total_issued);
            prop_assert_eq!(snap.per_sentiment_counts.values().sum::<u64>(), snap.total_issued);
        }
    }
}
