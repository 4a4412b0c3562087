//! Reward tiers and reward codes
//!
//! A score is mapped to the first tier (highest threshold first) whose
//! minimum it meets. Codes have the layout `PREFIX-EVENT-TIER-HASH8-HHMM`,
//! where `HASH8` is a truncated SHA-256 over user, tier, timestamp and a
//! per-process sequence. Issued codes are remembered so a truncated-hash
//! collision is re-drawn instead of handed out twice.

use crate::config::invalid;
use crate::error::{GateError, Result};
use crate::types::RewardCode;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Length of the hash segment of a reward code
const HASH_LEN: usize = 8;

/// One (min_score, tier_name) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min_score: u8,
    pub tier_name: String,

    #[serde(default)]
    pub description: String,
}

impl TierThreshold {
    pub fn new(min_score: u8, tier_name: impl Into<String>) -> Self {
        Self {
            min_score,
            tier_name: tier_name.into(),
            description: String::new(),
        }
    }
}

/// Tier thresholds ordered highest-to-lowest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierThresholds {
    tiers: Vec<TierThreshold>,
}

impl TierThresholds {
    /// Sort thresholds descending; empty sets and duplicate scores are rejected
    pub fn new(mut tiers: Vec<TierThreshold>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(invalid("at least one tier is required"));
        }
        if let Some(bad) = tiers.iter().find(|t| t.min_score > 10) {
            return Err(invalid(format!(
                "tier '{}' has min_score {} above 10",
                bad.tier_name, bad.min_score
            )));
        }

        tiers.sort_by(|a, b| b.min_score.cmp(&a.min_score));
        if tiers.windows(2).any(|w| w[0].min_score == w[1].min_score) {
            return Err(invalid("two tiers share the same min_score"));
        }

        Ok(Self { tiers })
    }

    /// First tier (highest threshold first) the score meets or exceeds
    ///
    /// Scores below every threshold get the lowest tier.
    pub fn tier_for(&self, score: u8) -> &TierThreshold {
        self.tiers
            .iter()
            .find(|t| score >= t.min_score)
            .unwrap_or_else(|| &self.tiers[self.tiers.len() - 1])
    }

    /// Position of a tier, 0 being the highest
    pub fn rank(&self, tier_name: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.tier_name == tier_name)
    }

    pub fn contains(&self, tier_name: &str) -> bool {
        self.rank(tier_name).is_some()
    }

    pub fn description(&self, tier_name: &str) -> Option<&str> {
        self.tiers
            .iter()
            .find(|t| t.tier_name == tier_name)
            .map(|t| t.description.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierThreshold> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// Parts of a well-formed reward code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeInfo {
    pub prefix: String,
    pub event_id: String,
    pub tier: String,
    pub hash: String,

    /// Issue time of day as HH:MM (UTC)
    pub issued_at: String,
}

/// Maps scores to tiers and mints unique codes
pub struct RewardTierAssigner {
    thresholds: TierThresholds,
    code_prefix: String,
    event_id: String,
    sequence: AtomicU64,
    salt: u64,
    issued: Mutex<HashSet<String>>,
}

impl RewardTierAssigner {
    pub fn new(
        thresholds: TierThresholds,
        code_prefix: impl Into<String>,
        event_id: impl Into<String>,
    ) -> Self {
        Self {
            thresholds,
            code_prefix: code_prefix.into(),
            event_id: event_id.into(),
            sequence: AtomicU64::new(0),
            salt: rand::thread_rng().next_u64(),
            issued: Mutex::new(HashSet::new()),
        }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Mark codes as already issued (e.g. after loading the document)
    pub fn remember_issued<I, S>(&self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        issued.extend(codes.into_iter().map(Into::into));
    }

    /// Pick the tier for `score` and mint a fresh code for it
    pub fn assign_tier(&self, score: u8, user_id: &str, at: DateTime<Utc>) -> RewardCode {
        let tier_name = self.thresholds.tier_for(score).tier_name.clone();

        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let code = self.format_code(&tier_name, user_id, at, seq);
            if issued.insert(code.clone()) {
                debug!("Issued {} code for score {}", tier_name, score);
                return RewardCode { tier_name, code };
            }
            warn!("Reward code collision on sequence {}, drawing again", seq);
        }
    }

    fn format_code(&self, tier: &str, user_id: &str, at: DateTime<Utc>, seq: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(b"|");
        hasher.update(tier.as_bytes());
        hasher.update(b"|");
        hasher.update(at.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
        hasher.update(seq.to_be_bytes());
        hasher.update(self.salt.to_be_bytes());
        let digest = hasher.finalize();

        let hash: String = digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<String>()
            .chars()
            .take(HASH_LEN)
            .collect();

        format!(
            "{}-{}-{}-{}-{}",
            self.code_prefix,
            self.event_id,
            tier,
            hash,
            at.format("%H%M")
        )
    }

    /// Validate a code's layout against this assigner's prefix, event and tiers
    pub fn parse_code(&self, code: &str) -> Result<CodeInfo> {
        let parts: Vec<&str> = code.trim().split('-').collect();
        if parts.len() != 5 {
            return Err(GateError::InvalidCode(format!(
                "expected 5 segments, found {}",
                parts.len()
            )));
        }

        let (prefix, event_id, tier) = (parts[0], parts[1], parts[2]);
        let (hash, time) = (parts[3], parts[4]);
        if prefix != self.code_prefix {
            return Err(GateError::InvalidCode(format!("unexpected prefix '{}'", prefix)));
        }
        if event_id != self.event_id {
            return Err(GateError::InvalidCode(format!("unexpected event '{}'", event_id)));
        }
        if !self.thresholds.contains(tier) {
            return Err(GateError::InvalidCode(format!("unknown tier '{}'", tier)));
        }
        if hash.len() != HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GateError::InvalidCode("malformed hash segment".into()));
        }
        if time.len() != 4 || !time.chars().all(|c| c.is_ascii_digit()) {
            return Err(GateError::InvalidCode("malformed time segment".into()));
        }

        Ok(CodeInfo {
            prefix: prefix.to_string(),
            event_id: event_id.to_string(),
            tier: tier.to_string(),
            hash: hash.to_string(),
            issued_at: format!("{}:{}", &time[..2], &time[2..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn thresholds() -> TierThresholds {
        TierThresholds::new(vec![
            TierThreshold::new(0, "BASIC"),
            TierThreshold::new(9, "PREMIUM"),
            TierThreshold::new(6, "STANDARD"),
        ])
        .unwrap()
    }

    fn assigner() -> RewardTierAssigner {
        RewardTierAssigner::new(thresholds(), "PIZZA", "CONF24")
    }

    #[test]
    fn test_thresholds_sorted_descending() {
        let names: Vec<_> = thresholds().iter().map(|t| t.tier_name.clone()).collect();
        assert_eq!(names, vec!["PREMIUM", "STANDARD", "BASIC"]);
    }

    #[test]
    fn test_tier_boundaries() {
        let t = thresholds();
        assert_eq!(t.tier_for(10).tier_name, "PREMIUM");
        assert_eq!(t.tier_for(9).tier_name, "PREMIUM");
        assert_eq!(t.tier_for(8).tier_name, "STANDARD");
        assert_eq!(t.tier_for(6).tier_name, "STANDARD");
        assert_eq!(t.tier_for(5).tier_name, "BASIC");
        assert_eq!(t.tier_for(0).tier_name, "BASIC");
    }

    #[test]
    fn test_score_below_all_thresholds_gets_lowest_tier() {
        let t = TierThresholds::new(vec![
            TierThreshold::new(8, "GOLD"),
            TierThreshold::new(3, "SILVER"),
        ])
        .unwrap();
        assert_eq!(t.tier_for(1).tier_name, "SILVER");
    }

    #[test]
    fn test_duplicate_scores_rejected() {
        let result = TierThresholds::new(vec![
            TierThreshold::new(5, "A"),
            TierThreshold::new(5, "B"),
        ]);
        assert!(matches!(result, Err(GateError::Config(_))));
        assert!(matches!(
            TierThresholds::new(vec![]),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            TierThresholds::new(vec![TierThreshold::new(11, "TOO_HIGH")]),
            Err(GateError::Config(_))
        ));
    }

    #[test]
    fn test_code_layout_parses_back() {
        let a = assigner();
        let at = Utc.with_ymd_and_hms(2024, 12, 1, 14, 5, 0).unwrap();
        let reward = a.assign_tier(9, "alice", at);

        assert_eq!(reward.tier_name, "PREMIUM");
        assert!(reward.code.starts_with("PIZZA-CONF24-PREMIUM-"));
        assert!(reward.code.ends_with("-1405"));

        let info = a.parse_code(&reward.code).unwrap();
        assert_eq!(info.tier, "PREMIUM");
        assert_eq!(info.issued_at, "14:05");
    }

    #[test]
    fn test_parse_rejects_malformed_codes() {
        let a = assigner();
        assert!(a.parse_code("PIZZA-CONF24-PREMIUM-ABC").is_err());
        assert!(a.parse_code("PASTA-CONF24-PREMIUM-ABCDEF12-1200").is_err());
        assert!(a.parse_code("PIZZA-CONF25-PREMIUM-ABCDEF12-1200").is_err());
        assert!(a.parse_code("PIZZA-CONF24-GOLD-ABCDEF12-1200").is_err());
        assert!(a.parse_code("PIZZA-CONF24-BASIC-XYZXYZXY-1200").is_err());
        assert!(a.parse_code("PIZZA-CONF24-BASIC-ABCDEF12-12h0").is_err());
        assert!(a.parse_code("PIZZA-CONF24-BASIC-ABCDEF12-1200").is_ok());
    }

    #[test]
    fn test_same_user_same_instant_codes_are_unique() {
        let a = assigner();
        let at = Utc::now();
        let codes: HashSet<String> = (0..500)
            .map(|_| a.assign_tier(7, "same-user", at).code)
            .collect();
        assert_eq!(codes.len(), 500);
    }

    #[test]
    fn test_concurrent_codes_are_unique() {
        let a = Arc::new(assigner());
        let at = Utc::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let a = a.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| a.assign_tier(5, "same-user", at).code)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(all.insert(code), "duplicate code issued");
            }
        }
        assert_eq!(all.len(), 800);
    }

    proptest! {
        #[test]
        fn prop_tier_assignment_is_monotonic(a in 0u8..=10, b in 0u8..=10) {
            let t = thresholds();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let rank_lo = t.rank(&t.tier_for(lo).tier_name).unwrap();
            let rank_hi = t.rank(&t.tier_for(hi).tier_name).unwrap();
            // Rank 0 is the best tier, so a higher score never has a larger rank
            prop_assert!(rank_hi <= rank_lo);
        }
    }
}
