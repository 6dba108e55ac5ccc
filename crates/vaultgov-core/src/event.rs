use serde::{Deserialize, Serialize};

use crate::proposal::{ExecutionOutcome, ProposalKind};
use crate::types::{AccountId, AssetId, Balance, ProposalId, Timestamp};

/// Where a release originated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReleaseSource {
    Vesting,
    Governance,
}

/// Notifications appended to the event log by each committed operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VaultEvent {
    Locked {
        depositor: AccountId,
        asset_id: AssetId,
        amount: Balance,
        lock_duration_secs: i64,
        vesting_duration_secs: i64,
    },
    Released {
        depositor: AccountId,
        amount: Balance,
        source: ReleaseSource,
    },
    LockExtended {
        depositor: AccountId,
        added_secs: i64,
        new_lock_duration_secs: i64,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: AccountId,
        kind: ProposalKind,
        parameter: Balance,
        end_time: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: AccountId,
        support: bool,
        weight: Balance,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
        outcome: ExecutionOutcome,
    },
}

/// An event together with its position in the log and commit time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub seq: u64,
    pub at: Timestamp,
    pub event: VaultEvent,
}
