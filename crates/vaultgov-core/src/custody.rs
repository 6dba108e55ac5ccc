use serde::{Deserialize, Serialize};

use crate::types::{AccountId, AssetId, Balance, Timestamp};

// ── CustodyRecord ─────────────────────────────────────────────────────────────

/// A depositor's frozen balance and its release schedule.
///
/// The record is fully frozen until `lock_start + lock_duration_secs`, then
/// unlocks linearly over `vesting_duration_secs`. Invariant:
/// `released_amount <= total_amount`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustodyRecord {
    pub depositor: AccountId,
    pub asset_id: AssetId,
    /// Set once at deposit, never decreases.
    pub total_amount: Balance,
    /// Cumulative amount paid out by vesting releases and governance.
    pub released_amount: Balance,
    pub lock_start: Timestamp,
    /// Only ever grows after creation, through an `ExtendLock` proposal.
    pub lock_duration_secs: i64,
    /// Zero means the whole remainder unlocks at `lock_end()`.
    pub vesting_duration_secs: i64,
}

impl CustodyRecord {
    pub fn new(
        depositor: AccountId,
        asset_id: AssetId,
        amount: Balance,
        lock_start: Timestamp,
        lock_duration_secs: i64,
        vesting_duration_secs: i64,
    ) -> Self {
        Self {
            depositor,
            asset_id,
            total_amount: amount,
            released_amount: 0,
            lock_start,
            lock_duration_secs,
            vesting_duration_secs,
        }
    }

    /// Amount still held in custody.
    pub fn remaining(&self) -> Balance {
        self.total_amount.saturating_sub(self.released_amount)
    }

    pub fn is_active(&self) -> bool {
        self.released_amount < self.total_amount
    }

    /// End of the fully-frozen period.
    pub fn lock_end(&self) -> Timestamp {
        self.lock_start.saturating_add(self.lock_duration_secs)
    }

    pub fn vesting_end(&self) -> Timestamp {
        self.lock_end().saturating_add(self.vesting_duration_secs)
    }
}

// ── CustodyState ──────────────────────────────────────────────────────────────

/// What the store holds for one depositor.
///
/// Keeps "never deposited" distinct from "fully released" at the type level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustodyState {
    NoRecord,
    Active(CustodyRecord),
    Exhausted(CustodyRecord),
}

impl CustodyState {
    pub fn from_record(record: Option<CustodyRecord>) -> Self {
        match record {
            None => CustodyState::NoRecord,
            Some(r) if r.is_active() => CustodyState::Active(r),
            Some(r) => CustodyState::Exhausted(r),
        }
    }

    pub fn active(self) -> Option<CustodyRecord> {
        match self {
            CustodyState::Active(r) => Some(r),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&CustodyRecord> {
        match self {
            CustodyState::NoRecord => None,
            CustodyState::Active(r) | CustodyState::Exhausted(r) => Some(r),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CustodyState::Active(_))
    }

    /// `total - released` for any stored record, zero when there is none.
    pub fn remaining(&self) -> Balance {
        self.record().map(CustodyRecord::remaining).unwrap_or(0)
    }
}
