//! Per-user sliding-window rate limiting
//!
//! Each user keeps the timestamps of accepted attempts still inside the
//! window. An attempt is accepted while fewer than `max_per_window` entries
//! remain; an entry still counts at exactly the window's age and drops out
//! only once it is strictly older, so any rolling window of that length,
//! both ends included, holds at most `max_per_window` acceptances.
//!
//! The limiter itself is stateless; per-user state lives in a [`RateTable`]
//! that is persisted with the rest of the gate document and mutated under the
//! document lock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-user window state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRateState {
    pub user_id: String,

    /// Oldest accepted attempt still inside the window
    pub window_start: DateTime<Utc>,

    /// Accepted attempts inside the window
    pub request_count: u32,

    /// Timestamps of those attempts, oldest first
    #[serde(default)]
    pub accepted_at: Vec<DateTime<Utc>>,
}

impl UserRateState {
    fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            window_start: now,
            request_count: 0,
            accepted_at: Vec::new(),
        }
    }

    fn sync_counters(&mut self, now: DateTime<Utc>) {
        self.request_count = self.accepted_at.len() as u32;
        self.window_start = self.accepted_at.first().copied().unwrap_or(now);
    }
}

/// Rate state for every user, keyed by user id
pub type RateTable = BTreeMap<String, UserRateState>;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub accepted: bool,

    /// Slots left in the window after this decision
    pub remaining: u32,

    /// When the next slot frees up (only set on rejection)
    pub retry_after: Option<DateTime<Utc>>,
}

/// Sliding-window limiter configuration and logic
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: std::time::Duration) -> Self {
        Self {
            max_per_window,
            window: Duration::seconds(window.as_secs() as i64)
                + Duration::nanoseconds(i64::from(window.subsec_nanos())),
        }
    }

    pub fn max_per_window(&self) -> u32 {
        self.max_per_window
    }

    /// Admit or reject an attempt by `user_id` at `now`
    ///
    /// On acceptance the attempt is recorded in `table`. On rejection the
    /// table is left untouched.
    pub fn allow(&self, table: &mut RateTable, user_id: &str, now: DateTime<Utc>) -> RateDecision {
        let in_window = self.in_window(table.get(user_id), now);
        let used = in_window.len() as u32;

        if used >= self.max_per_window {
            debug!("Rate limit reached for user ({} in window)", used);
            return RateDecision {
                accepted: false,
                remaining: 0,
                retry_after: self
                    .retry_after(table, user_id, now)
                    .or(Some(now + self.window)),
            };
        }

        let state = table
            .entry(user_id.to_string())
            .or_insert_with(|| UserRateState::new(user_id, now));
        state.accepted_at = in_window;
        state.accepted_at.push(now);
        state.sync_counters(now);

        RateDecision {
            accepted: true,
            remaining: self.max_per_window - state.request_count,
            retry_after: None,
        }
    }

    /// Slots left for `user_id` at `now`, without recording anything
    pub fn remaining(&self, table: &RateTable, user_id: &str, now: DateTime<Utc>) -> u32 {
        let used = self.in_window(table.get(user_id), now).len() as u32;
        self.max_per_window.saturating_sub(used)
    }

    /// Instant after which `user_id` regains a slot; `None` if one is free at `now`
    pub fn retry_after(
        &self,
        table: &RateTable,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let in_window = self.in_window(table.get(user_id), now);
        if (in_window.len() as u32) < self.max_per_window {
            return None;
        }
        let freeing = in_window.len() + 1 - self.max_per_window as usize;
        in_window.get(freeing - 1).map(|t| *t + self.window)
    }

    /// Give back the slot reserved at `at`, if still recorded
    pub fn release(&self, table: &mut RateTable, user_id: &str, at: DateTime<Utc>) -> bool {
        let Some(state) = table.get_mut(user_id) else {
            return false;
        };
        let Some(pos) = state.accepted_at.iter().rposition(|t| *t == at) else {
            return false;
        };
        state.accepted_at.remove(pos);
        state.sync_counters(at);
        if state.accepted_at.is_empty() {
            table.remove(user_id);
        }
        true
    }

    /// Drop users whose every entry has left the window
    pub fn prune(&self, table: &mut RateTable, now: DateTime<Utc>) -> usize {
        let before = table.len();
        table.retain(|_, state| !self.in_window(Some(state), now).is_empty());
        before - table.len()
    }

    fn in_window(&self, state: Option<&UserRateState>, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        state
            .map(|s| {
                s.accepted_at
                    .iter()
                    .copied()
                    .filter(|t| now - *t <= self.window)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(3, std::time::Duration::from_secs(24 * 3600))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_accepts_up_to_limit_then_rejects() {
        let limiter = limiter();
        let mut table = RateTable::new();

        let remaining: Vec<u32> = (0..3)
            .map(|i| {
                let d = limiter.allow(&mut table, "alice", t0() + Duration::minutes(i));
                assert!(d.accepted);
                d.remaining
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let rejected = limiter.allow(&mut table, "alice", t0() + Duration::minutes(10));
        assert!(!rejected.accepted);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.retry_after, Some(t0() + Duration::hours(24)));
    }

    #[test]
    fn test_rejection_has_no_side_effects() {
        let limiter = RateLimiter::new(1, std::time::Duration::from_secs(60));
        let mut table = RateTable::new();
        limiter.allow(&mut table, "bob", t0());
        let before = table.clone();

        let d = limiter.allow(&mut table, "bob", t0() + Duration::seconds(5));
        assert!(!d.accepted);
        assert_eq!(table, before);
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter();
        let mut table = RateTable::new();
        limiter.allow(&mut table, "alice", t0());
        limiter.allow(&mut table, "alice", t0() + Duration::hours(12));
        limiter.allow(&mut table, "alice", t0() + Duration::hours(13));
        assert!(!limiter.allow(&mut table, "alice", t0() + Duration::hours(20)).accepted);

        // Exactly one window after the first entry it still counts
        assert!(!limiter.allow(&mut table, "alice", t0() + Duration::hours(24)).accepted);

        // The first entry has expired, the other two are still in the window
        let d = limiter.allow(
            &mut table,
            "alice",
            t0() + Duration::hours(24) + Duration::seconds(1),
        );
        assert!(d.accepted);
        assert_eq!(d.remaining, 0);

        let state = &table["alice"];
        assert_eq!(state.request_count, 3);
        assert_eq!(state.window_start, t0() + Duration::hours(12));
    }

    #[test]
    fn test_entry_counts_at_exact_window_age() {
        let limiter = RateLimiter::new(1, std::time::Duration::from_secs(3600));
        let mut table = RateTable::new();
        assert!(limiter.allow(&mut table, "alice", t0()).accepted);

        let edge = t0() + Duration::seconds(3600);
        let d = limiter.allow(&mut table, "alice", edge);
        assert!(!d.accepted);
        assert_eq!(d.retry_after, Some(edge));
        assert_eq!(limiter.remaining(&table, "alice", edge), 0);
        assert_eq!(limiter.prune(&mut table, edge), 0);

        let later = edge + Duration::seconds(1);
        assert_eq!(limiter.remaining(&table, "alice", later), 1);
        assert!(limiter.allow(&mut table, "alice", later).accepted);
    }

    #[test]
    fn test_users_are_independent() {
        let limiter = RateLimiter::new(1, std::time::Duration::from_secs(3600));
        let mut table = RateTable::new();
        assert!(limiter.allow(&mut table, "alice", t0()).accepted);
        assert!(limiter.allow(&mut table, "bob", t0()).accepted);
        assert!(!limiter.allow(&mut table, "alice", t0()).accepted);
        assert_eq!(limiter.remaining(&table, "carol", t0()), 1);
    }

    #[test]
    fn test_retry_after() {
        let limiter = RateLimiter::new(2, std::time::Duration::from_secs(3600));
        let mut table = RateTable::new();
        assert_eq!(limiter.retry_after(&table, "alice", t0()), None);

        limiter.allow(&mut table, "alice", t0());
        limiter.allow(&mut table, "alice", t0() + Duration::minutes(20));
        assert_eq!(
            limiter.retry_after(&table, "alice", t0() + Duration::minutes(30)),
            Some(t0() + Duration::hours(1))
        );
        assert_eq!(
            limiter.retry_after(&table, "alice", t0() + Duration::hours(1)),
            Some(t0() + Duration::hours(1))
        );
        assert_eq!(
            limiter.retry_after(&table, "alice", t0() + Duration::minutes(61)),
            None
        );
    }

    #[test]
    fn test_release_returns_slot() {
        let limiter = RateLimiter::new(1, std::time::Duration::from_secs(3600));
        let mut table = RateTable::new();
        assert!(limiter.allow(&mut table, "alice", t0()).accepted);
        assert!(limiter.release(&mut table, "alice", t0()));
        assert!(!table.contains_key("alice"));
        assert!(limiter.allow(&mut table, "alice", t0()).accepted);
        assert!(!limiter.release(&mut table, "alice", t0() + Duration::seconds(1)));
    }

    #[test]
    fn test_prune_drops_expired_users() {
        let limiter = RateLimiter::new(2, std::time::Duration::from_secs(60));
        let mut table = RateTable::new();
        limiter.allow(&mut table, "old", t0());
        limiter.allow(&mut table, "new", t0() + Duration::seconds(100));
        assert_eq!(limiter.prune(&mut table, t0() + Duration::seconds(120)), 1);
        assert!(table.contains_key("new"));
    }

    proptest! {
        #[test]
        fn prop_never_more_than_max_in_any_window(
            offsets in proptest::collection::vec(0i64..10_000, 1..60),
            max in 1u32..5,
        ) {
            let window_secs = 600i64;
            let limiter = RateLimiter::new(max, std::time::Duration::from_secs(window_secs as u64));
            let mut table = RateTable::new();

            let mut times: Vec<i64> = offsets;
            times.sort_unstable();

            let mut accepted = Vec::new();
            for offset in times {
                let now = t0() + Duration::seconds(offset);
                if limiter.allow(&mut table, "user", now).accepted {
                    accepted.push(offset);
                }
            }

            // Every rolling window [t, t + window] holds at most `max` acceptances
            for start in &accepted {
                let in_window = accepted
                    .iter()
                    .filter(|t| **t >= *start && **t <= *start + window_secs)
                    .count() as u32;
                prop_assert!(in_window <= max);
            }
        }
    }
}
