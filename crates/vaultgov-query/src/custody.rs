use vaultgov_core::custody::{CustodyRecord, CustodyState};
use vaultgov_core::error::VaultError;
use vaultgov_core::types::{AccountId, Balance, Timestamp};
use vaultgov_state::StateDb;
use vaultgov_vesting::{releasable_amount, vested_amount};

use crate::format_ts;

/// Query helpers for custody records.
pub struct CustodyQuery<'a> {
    db: &'a StateDb,
}

impl<'a> CustodyQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get(&self, depositor: &AccountId) -> Result<Option<CustodyRecord>, VaultError> {
        self.db.get_custody(depositor)
    }

    pub fn state(&self, depositor: &AccountId) -> Result<CustodyState, VaultError> {
        self.db.custody_state(depositor)
    }

    pub fn remaining(&self, depositor: &AccountId) -> Result<Balance, VaultError> {
        Ok(self.db.custody_state(depositor)?.remaining())
    }

    /// Amount a vesting release would pay at `now` (0 when inactive or still locked).
    pub fn releasable_now(&self, depositor: &AccountId, now: Timestamp) -> Result<Balance, VaultError> {
        Ok(match self.db.custody_state(depositor)? {
            CustodyState::Active(r) => releasable_amount(&r, now),
            _ => 0,
        })
    }

    /// Human-readable summary of a depositor's custody.
    pub fn describe(&self, depositor: &AccountId, now: Timestamp) -> Result<String, VaultError> {
        let r = match self.db.custody_state(depositor)? {
            CustodyState::NoRecord => return Ok(format!("Custody {} | no record", depositor)),
            CustodyState::Exhausted(r) => {
                return Ok(format!(
                    "Custody {} | {} of asset {} | fully released",
                    depositor,
                    r.total_amount,
                    &r.asset_id.to_hex()[..16]
                ))
            }
            CustodyState::Active(r) => r,
        };

        let status = if now < r.lock_end() {
            let days = (r.lock_end() - now) / 86_400;
            format!("Locked until {} ({} days)", format_ts(r.lock_end()), days)
        } else if now < r.vesting_end() {
            format!(
                "Vesting until {} ({} vested, {} releasable)",
                format_ts(r.vesting_end()),
                vested_amount(&r, now),
                releasable_amount(&r, now)
            )
        } else {
            format!("Fully vested, {} releasable", releasable_amount(&r, now))
        };

        Ok(format!(
            "Custody {} | {}/{} released of asset {} | {}",
            depositor,
            r.released_amount,
            r.total_amount,
            &r.asset_id.to_hex()[..16],
            status
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultgov_core::constants::SECS_PER_DAY;
    use vaultgov_core::types::AssetId;

    const START: Timestamp = 1_767_225_600; // 2026-01-01 00:00:00 UTC

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("vaultgov_query_custody_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn seed(db: &StateDb, released: Balance) -> AccountId {
        let alice = AccountId::derive(b"alice");
        let mut r = CustodyRecord::new(
            alice.clone(),
            AssetId::derive(b"VLT"),
            1_000,
            START,
            180 * SECS_PER_DAY,
            100 * SECS_PER_DAY,
        );
        r.released_amount = released;
        db.put_custody(&r).unwrap();
        alice
    }

    #[test]
    fn describe_locked_record() {
        let db = temp_db("locked");
        let alice = seed(&db, 0);
        let s = CustodyQuery::new(&db).describe(&alice, START).unwrap();
        assert!(s.contains("0/1000 released"), "{s}");
        assert!(s.contains("Locked until 2026-06-30"), "{s}");
        assert!(s.contains("(180 days)"), "{s}");
    }

    #[test]
    fn describe_vesting_record() {
        let db = temp_db("vesting");
        let alice = seed(&db, 100);
        let now = START + 230 * SECS_PER_DAY;
        let s = CustodyQuery::new(&db).describe(&alice, now).unwrap();
        assert!(s.contains("500 vested, 400 releasable"), "{s}");
    }

    #[test]
    fn releasable_and_remaining() {
        let db = temp_db("amounts");
        let alice = seed(&db, 100);
        let q = CustodyQuery::new(&db);
        assert_eq!(q.remaining(&alice).unwrap(), 900);
        assert_eq!(q.releasable_now(&alice, START).unwrap(), 0);
        assert_eq!(q.releasable_now(&alice, START + 280 * SECS_PER_DAY).unwrap(), 900);
    }

    #[test]
    fn describe_missing_and_exhausted() {
        let db = temp_db("missing");
        let q = CustodyQuery::new(&db);
        assert!(q.describe(&AccountId::derive(b"bob"), START).unwrap().contains("no record"));
        let alice = seed(&db, 1_000);
        assert!(q.describe(&alice, START).unwrap().contains("fully released"));
        assert_eq!(q.remaining(&alice).unwrap(), 0);
    }
}
