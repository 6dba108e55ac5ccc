//! End-to-end custody and governance lifecycle.
//!
//! Drives a `VaultEngine` over a real sled database and the in-memory token
//! ledger through deposit → vest → release and propose → vote → execute.
//!
//! Run with:
//!   cargo test -p vaultgov-state --test lifecycle

use std::sync::Arc;

use vaultgov_core::constants::{SECS_PER_DAY, WEIGHT_SCALE};
use vaultgov_core::error::VaultError;
use vaultgov_core::event::{ReleaseSource, VaultEvent};
use vaultgov_core::ledger::TokenLedger;
use vaultgov_core::params::VaultParams;
use vaultgov_core::proposal::{ExecutionOutcome, ProposalKind, ProposalPhase};
use vaultgov_core::types::{AccountId, AssetId, Balance, Timestamp};
use vaultgov_state::{InMemoryLedger, StateDb, VaultEngine};

const T0: Timestamp = 1_900_000_000;
const DAY: i64 = SECS_PER_DAY;
const WINDOW: i64 = 7 * DAY;

type Engine = VaultEngine<Arc<InMemoryLedger>>;

struct Harness {
    engine: Engine,
    ledger: Arc<InMemoryLedger>,
    asset: AssetId,
}

impl Harness {
    fn new(name: &str) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("vaultgov_state=debug")
            .with_test_writer()
            .try_init();

        let dir = std::env::temp_dir().join(format!("vaultgov_lifecycle_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open db"));
        let ledger = Arc::new(InMemoryLedger::new(AccountId::derive(b"vault")));
        let engine = VaultEngine::new(db, Arc::clone(&ledger), VaultParams::default())
            .expect("default params are valid");
        Self { engine, ledger, asset: AssetId::derive(b"VLT") }
    }

    fn account(&self, label: &str, balance: Balance) -> AccountId {
        let id = AccountId::derive(label.as_bytes());
        if balance > 0 {
            self.ledger.mint(&self.asset, &id, balance).unwrap();
        }
        id
    }

    fn balance(&self, who: &AccountId) -> Balance {
        self.ledger.balance_of(&self.asset, who).unwrap()
    }
}

#[test]
fn linear_vesting_round_trip() {
    let h = Harness::new("vesting_round_trip");
    let alice = h.account("alice", 1_000);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 100 * DAY, T0).unwrap();

    let halfway = T0 + 180 * DAY + 50 * DAY;
    assert_eq!(h.engine.release_vested(&alice, halfway).unwrap(), 500);

    let end = T0 + 180 * DAY + 100 * DAY;
    assert_eq!(h.engine.release_vested(&alice, end).unwrap(), 500);

    let record = h.engine.db.get_custody(&alice).unwrap().unwrap();
    assert_eq!(record.released_amount, 1_000);
    assert!(!record.is_active());
    assert_eq!(h.balance(&alice), 1_000);
    assert_eq!(h.engine.view_remaining(&alice).unwrap(), 0);
    assert!(matches!(
        h.engine.release_vested(&alice, end + DAY),
        Err(VaultError::NoActiveLock(_))
    ));
}

#[test]
fn released_amount_is_monotonic_and_bounded() {
    let h = Harness::new("monotonic");
    let alice = h.account("alice", 777);
    h.engine.deposit(&alice, &h.asset, 777, 180 * DAY, 13 * DAY, T0).unwrap();

    let mut last = 0;
    for day in 0..=15 {
        let now = T0 + 180 * DAY + day * DAY + 3_600;
        match h.engine.release_vested(&alice, now) {
            Ok(_) | Err(VaultError::NothingToRelease) => {}
            // Fully released from day 13 on.
            Err(VaultError::NoActiveLock(_)) if day > 13 => {}
            Err(e) => panic!("unexpected release error on day {day}: {e:?}"),
        }
        let record = h.engine.db.get_custody(&alice).unwrap().unwrap();
        assert!(record.released_amount >= last);
        assert!(record.released_amount <= record.total_amount);
        last = record.released_amount;
    }
    assert_eq!(last, 777);
}

#[test]
fn voting_window_boundaries() {
    let h = Harness::new("window");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 100);
    let carol = h.account("carol", 100);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 0, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ExtendLock, DAY as u128, T0).unwrap();
    let end = T0 + WINDOW;

    assert!(h.engine.vote(id, &bob, true, end).is_ok());
    assert!(matches!(h.engine.vote(id, &carol, true, end + 1), Err(VaultError::VotingClosed)));
    assert!(matches!(
        h.engine.execute(id, end),
        Err(VaultError::VotingNotOver { ends_at }) if ends_at == end
    ));

    let proposal = h.engine.db.get_proposal(id).unwrap().unwrap();
    assert_eq!(proposal.phase(end), ProposalPhase::Open);
    assert_eq!(proposal.phase(end + 1), ProposalPhase::Closed);
    assert_eq!(h.engine.execute(id, end + 1).unwrap(), ExecutionOutcome::Passed);
}

#[test]
fn execute_applies_once() {
    let h = Harness::new("execute_once");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 1_000);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 100 * DAY, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ReleaseEarly, 250, T0).unwrap();
    h.engine.vote(id, &bob, true, T0 + DAY).unwrap();

    h.engine.execute(id, T0 + WINDOW + 1).unwrap();
    assert!(matches!(h.engine.execute(id, T0 + WINDOW + 2), Err(VaultError::AlreadyExecuted)));

    assert_eq!(h.engine.view_remaining(&alice).unwrap(), 750);
    assert_eq!(h.balance(&alice), 250);
}

#[test]
fn weights_accumulate_and_double_votes_are_rejected() {
    let h = Harness::new("accumulate");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 250);
    let carol = h.account("carol", 750);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 0, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ReleaseEarly, 10, T0).unwrap();
    let wb = h.engine.vote(id, &bob, true, T0).unwrap();
    let wc = h.engine.vote(id, &carol, true, T0).unwrap();
    assert_eq!(wb, WEIGHT_SCALE / 8);
    assert_eq!(wc, 3 * WEIGHT_SCALE / 8);

    let before = h.engine.db.get_proposal(id).unwrap().unwrap();
    assert_eq!(before.yes_weight, wb + wc);

    assert!(matches!(h.engine.vote(id, &bob, false, T0), Err(VaultError::AlreadyVoted)));
    let after = h.engine.db.get_proposal(id).unwrap().unwrap();
    assert_eq!(after.yes_weight, before.yes_weight);
    assert_eq!(after.no_weight, before.no_weight);
    assert_eq!(h.engine.db.votes_for(id).unwrap().len(), 2);
}

#[test]
fn release_early_beyond_total_stays_unexecuted() {
    let h = Harness::new("exceeds_total");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 1_000);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 100 * DAY, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ReleaseEarly, 1_001, T0).unwrap();
    h.engine.vote(id, &bob, true, T0).unwrap();

    assert!(matches!(h.engine.execute(id, T0 + WINDOW + 1), Err(VaultError::ExceedsTotal)));
    let proposal = h.engine.db.get_proposal(id).unwrap().unwrap();
    assert!(!proposal.executed);
    assert_eq!(proposal.outcome, None);
    assert_eq!(h.engine.view_remaining(&alice).unwrap(), 1_000);
    assert_eq!(h.balance(&alice), 0);
}

#[test]
fn passed_proposal_against_exhausted_lock_is_stuck() {
    let h = Harness::new("stuck");
    let alice = h.account("alice", 100);
    let bob = h.account("bob", 100);
    h.engine.deposit(&alice, &h.asset, 100, 180 * DAY, 0, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ReleaseEarly, 10, T0).unwrap();
    h.engine.vote(id, &bob, true, T0).unwrap();
    h.engine.release_vested(&alice, T0 + 180 * DAY).unwrap();

    let err = h.engine.execute(id, T0 + 180 * DAY + 1).unwrap_err();
    assert!(matches!(err, VaultError::NoActiveLock(_)));
    assert!(!h.engine.db.get_proposal(id).unwrap().unwrap().executed);
    assert_eq!(h.balance(&alice), 100);
}

#[test]
fn extend_lock_executes_against_exhausted_lock() {
    let h = Harness::new("extend_exhausted");
    let alice = h.account("alice", 100);
    let bob = h.account("bob", 100);
    h.engine.deposit(&alice, &h.asset, 100, 180 * DAY, 0, T0).unwrap();

    let id = h.engine.propose(&alice, ProposalKind::ExtendLock, DAY as u128, T0).unwrap();
    h.engine.vote(id, &bob, true, T0).unwrap();
    h.engine.release_vested(&alice, T0 + 180 * DAY).unwrap();

    let outcome = h.engine.execute(id, T0 + 180 * DAY + 1).unwrap();
    assert_eq!(outcome, ExecutionOutcome::Passed);
    let proposal = h.engine.db.get_proposal(id).unwrap().unwrap();
    assert!(proposal.executed);
    assert_eq!(proposal.phase(T0 + 180 * DAY + 1), ProposalPhase::Executed);

    let record = h.engine.db.get_custody(&alice).unwrap().unwrap();
    assert_eq!(record.lock_duration_secs, 181 * DAY);
    assert!(!record.is_active());
    assert_eq!(h.engine.view_remaining(&alice).unwrap(), 0);
}

#[test]
fn custody_balance_tracks_committed_state() {
    let h = Harness::new("custody_balance");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 1_000);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 100 * DAY, T0).unwrap();
    h.engine.propose(&alice, ProposalKind::ReleaseEarly, 100, T0).unwrap();
    h.engine.propose(&alice, ProposalKind::ExtendLock, DAY as u128, T0).unwrap();
    h.engine.vote(0, &bob, true, T0).unwrap();
    h.engine.execute(0, T0 + WINDOW + 1).unwrap();
    h.engine.db.flush().unwrap();

    let custodian = h.ledger.custodian().clone();
    assert_eq!(h.balance(&custodian), 900);
    assert_eq!(h.ledger.custody_balance(&h.asset).unwrap(), h.engine.view_remaining(&alice).unwrap());
    assert_eq!(h.engine.db.proposal_count(), 2);
    assert_eq!(h.engine.db.next_proposal_id().unwrap(), 2);
}

#[test]
fn event_log_records_every_operation_in_order() {
    let h = Harness::new("events");
    let alice = h.account("alice", 1_000);
    let bob = h.account("bob", 1_000);
    h.engine.deposit(&alice, &h.asset, 1_000, 180 * DAY, 0, T0).unwrap();
    let id = h.engine.propose(&alice, ProposalKind::ReleaseEarly, 100, T0).unwrap();
    h.engine.vote(id, &bob, true, T0).unwrap();
    h.engine.execute(id, T0 + WINDOW + 1).unwrap();
    h.engine.release_vested(&alice, T0 + 180 * DAY).unwrap();

    let events: Vec<VaultEvent> = h
        .engine
        .db
        .events_since(0)
        .unwrap()
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(events.len(), 6);
    assert!(matches!(events[0], VaultEvent::Locked { .. }));
    assert!(matches!(events[1], VaultEvent::ProposalCreated { proposal_id: 0, .. }));
    assert!(matches!(events[2], VaultEvent::VoteCast { support: true, .. }));
    assert!(matches!(
        events[3],
        VaultEvent::Released { amount: 100, source: ReleaseSource::Governance, .. }
    ));
    assert!(matches!(
        events[4],
        VaultEvent::ProposalExecuted { outcome: ExecutionOutcome::Passed, .. }
    ));
    assert!(matches!(
        events[5],
        VaultEvent::Released { amount: 900, source: ReleaseSource::Vesting, .. }
    ));
}
