//! Linear vesting schedule.
//!
//! A record is fully frozen until `lock_end = lock_start + lock_duration`.
//! Afterwards the cumulative vested amount grows linearly:
//!
//!   vested(now) = total × (now − lock_end) / vesting_duration
//!
//! and saturates at `total` once `now >= lock_end + vesting_duration`
//! (immediately at `lock_end` when the vesting duration is zero).

use vaultgov_core::custody::CustodyRecord;
use vaultgov_core::types::{Balance, Timestamp};

/// Cumulative amount vested at `now`, regardless of what was already released.
pub fn vested_amount(record: &CustodyRecord, now: Timestamp) -> Balance {
    let lock_end = record.lock_end();
    if now < lock_end {
        return 0;
    }
    if now >= record.vesting_end() || record.vesting_duration_secs <= 0 {
        return record.total_amount;
    }
    // 0 <= elapsed < vesting_duration here.
    let elapsed = (now - lock_end) as u128;
    let duration = record.vesting_duration_secs as u128;
    mul_div_floor(record.total_amount, elapsed, duration)
}

/// Amount a vesting release would pay at `now`.
///
/// Zero before the lock ends, and zero when governance releases have already
/// run ahead of the schedule.
pub fn releasable_amount(record: &CustodyRecord, now: Timestamp) -> Balance {
    vested_amount(record, now).saturating_sub(record.released_amount)
}

/// `floor(a × b / d)` for `b < d`, without the intermediate `a × b`.
fn mul_div_floor(a: u128, b: u128, d: u128) -> u128 {
    let q = a / d;
    let r = a % d;
    // r < d and b < d, and both fit in i64, so r × b < 2^126.
    q * b + r * b / d
}
