use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The persisted vote budget for one browser profile.
///
/// `day` is the local calendar date of the last write. A record whose day is
/// not today is stale and resets to the daily baseline on the next read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allowance {
    pub remaining: u32,
    pub day: NaiveDate,
}

/// One-time marker that the share reward has been claimed.
///
/// Once `granted` is true it stays true for the lifetime of the storage,
/// independent of the daily reset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareGrant {
    pub granted: bool,
}

/// Quota limits applied by the allowance store and the share reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowancePolicy {
    /// Budget restored at the start of each calendar day.
    pub daily: u32,
    /// Absolute ceiling, above the daily baseline so share bonuses fit.
    pub cap: u32,
    /// Units granted by the one-time share reward.
    pub share_bonus: u32,
}

impl Default for AllowancePolicy {
    fn default() -> Self {
        Self {
            daily: 3,
            cap: 6,
            share_bonus: 3,
        }
    }
}
