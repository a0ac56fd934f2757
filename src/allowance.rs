//! Daily vote allowance persisted in local storage.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::models::{Allowance, AllowancePolicy};
use crate::storage::{KeyValueStore, LocalStateError};

/// Receipt for one unit taken from the allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spend {
    pub day: NaiveDate,
    pub before: u32,
    pub after: u32,
}

/// Storage key for the allowance record.
pub const ALLOWANCE_KEY: &str = "oryn_vote_tracking";

/// Reads and writes the visitor's remaining votes, keyed by calendar day.
///
/// A missing, malformed or stale record (written on an earlier day) reads as
/// the daily baseline, and that reset is persisted before it is returned.
/// Writes always stamp today's date.
#[derive(Clone)]
pub struct AllowanceStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: AllowancePolicy,
}

impl AllowanceStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(store, clock, AllowancePolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: AllowancePolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> AllowancePolicy {
        self.policy
    }

    /// Current remaining votes, resetting to the daily baseline on a new day.
    pub fn get_remaining(&self) -> u32 {
        let today = self.clock.today();
        match self.read_record() {
            Some(record) if record.day == today => record.remaining,
            _ => {
                tracing::debug!("Allowance reset to {} for {}", self.policy.daily, today);
                self.set_remaining(self.policy.daily)
            }
        }
    }

    /// Persist `n` (clamped to the cap) stamped with today's date.
    ///
    /// Returns the value actually stored.
    pub fn set_remaining(&self, n: u32) -> u32 {
        let record = Allowance {
            remaining: n.min(self.policy.cap),
            day: self.clock.today(),
        };
        if let Err(e) = self.write_record(&record) {
            tracing::warn!("Failed to persist allowance: {}", e);
        }
        record.remaining
    }

    /// Take one unit from today's allowance.
    ///
    /// Returns `None` without writing anything when nothing is left.
    pub fn spend(&self) -> Option<Spend> {
        let remaining = self.get_remaining();
        if remaining == 0 {
            return None;
        }
        let after = self.set_remaining(remaining - 1);
        Some(Spend {
            day: self.clock.today(),
            before: remaining,
            after,
        })
    }

    /// Give back a unit taken by [`spend`](Self::spend).
    ///
    /// A refund for an earlier day is dropped: the daily reset already
    /// restored the budget. Returns the remaining value after the refund.
    pub fn refund(&self, spend: &Spend) -> u32 {
        let remaining = self.get_remaining();
        if spend.day != self.clock.today() {
            tracing::debug!("Dropping refund from {}", spend.day);
            return remaining;
        }
        self.set_remaining(remaining + 1)
    }

    /// Add `units` on top of the current value, clamped to the cap.
    pub fn top_up(&self, units: u32) -> u32 {
        let remaining = self.get_remaining();
        self.set_remaining(remaining.saturating_add(units))
    }

    fn read_record(&self) -> Option<Allowance> {
        let raw = self.store.get(ALLOWANCE_KEY)?;
        match self.parse_record(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("{}; falling back to default allowance", e);
                None
            }
        }
    }

    fn parse_record(&self, raw: &str) -> Result<Allowance, LocalStateError> {
        let malformed = |reason: String| LocalStateError::Malformed {
            key: ALLOWANCE_KEY.to_string(),
            reason,
        };
        let record: Allowance = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        if record.remaining > self.policy.cap {
            return Err(malformed(format!(
                "remaining {} exceeds cap {}",
                record.remaining, self.policy.cap
            )));
        }
        Ok(record)
    }

    fn write_record(&self, record: &Allowance) -> Result<(), LocalStateError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(ALLOWANCE_KEY, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn setup() -> (AllowanceStore, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(day(1)));
        let allowance = AllowanceStore::new(store.clone(), clock.clone());
        (allowance, store, clock)
    }

    #[test]
    fn fresh_store_starts_at_daily_baseline() {
        let (allowance, store, _) = setup();
        assert_eq!(allowance.get_remaining(), 3);
        // The reset is persisted, not just returned.
        assert!(store.get(ALLOWANCE_KEY).is_some());
    }

    #[test]
    fn repeated_reads_on_the_same_day_agree() {
        let (allowance, _, _) = setup();
        allowance.set_remaining(1);
        assert_eq!(allowance.get_remaining(), 1);
        assert_eq!(allowance.get_remaining(), 1);
    }

    #[test]
    fn new_day_resets_to_baseline() {
        let (allowance, _, clock) = setup();
        allowance.set_remaining(0);
        clock.advance_days(1);
        assert_eq!(allowance.get_remaining(), 3);
    }

    #[test]
    fn reset_also_discards_share_bonus() {
        let (allowance, _, clock) = setup();
        allowance.set_remaining(6);
        clock.set(day(2));
        assert_eq!(allowance.get_remaining(), 3);
    }

    #[test]
    fn set_clamps_to_cap() {
        let (allowance, _, _) = setup();
        assert_eq!(allowance.set_remaining(42), 6);
        assert_eq!(allowance.get_remaining(), 6);
    }

    #[test]
    fn malformed_record_reads_as_default() {
        let (allowance, store, _) = setup();
        store
            .set(ALLOWANCE_KEY, "{\"power\":\"lots\"}".to_string())
            .unwrap();
        assert_eq!(allowance.get_remaining(), 3);
    }

    #[test]
    fn out_of_range_record_reads_as_default() {
        let (allowance, store, _) = setup();
        store
            .set(
                ALLOWANCE_KEY,
                "{\"remaining\":99,\"day\":\"2026-03-01\"}".to_string(),
            )
            .unwrap();
        assert_eq!(allowance.get_remaining(), 3);
    }

    #[test]
    fn spend_stops_at_zero() {
        let (allowance, _, _) = setup();
        for expected in [2, 1, 0] {
            let spend = allowance.spend().expect("allowance left");
            assert_eq!(spend.after, expected);
        }
        assert!(allowance.spend().is_none());
        assert_eq!(allowance.get_remaining(), 0);
    }

    #[test]
    fn refund_restores_a_spent_unit() {
        let (allowance, _, _) = setup();
        let spend = allowance.spend().unwrap();
        assert_eq!(allowance.refund(&spend), 3);
    }

    #[test]
    fn refund_from_previous_day_is_dropped() {
        let (allowance, _, clock) = setup();
        allowance.spend().unwrap();
        let spend = allowance.spend().unwrap();
        clock.advance_days(1);
        assert_eq!(allowance.refund(&spend), 3);
    }

    #[test]
    fn top_up_is_capped() {
        let (allowance, _, _) = setup();
        allowance.set_remaining(5);
        assert_eq!(allowance.top_up(3), 6);
    }

    #[test]
    fn custom_policy_changes_baseline() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(day(1)));
        let allowance = AllowanceStore::with_policy(
            store,
            clock,
            AllowancePolicy {
                daily: 5,
                cap: 8,
                share_bonus: 2,
            },
        );
        assert_eq!(allowance.get_remaining(), 5);
        assert_eq!(allowance.set_remaining(10), 8);
    }
}
