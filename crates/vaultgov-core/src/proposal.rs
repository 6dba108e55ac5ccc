use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VaultError;
use crate::types::{AccountId, AssetId, Balance, ProposalId, Timestamp};

// ── ProposalKind ──────────────────────────────────────────────────────────────

/// The change a proposal applies to its proposer's custody record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProposalKind {
    /// Pay out `parameter` tokens ahead of the vesting schedule.
    ReleaseEarly,
    /// Add `parameter` seconds to the lock duration.
    ExtendLock,
}

impl ProposalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalKind::ReleaseEarly => "release_early",
            ProposalKind::ExtendLock => "extend_lock",
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release_early" | "ReleaseEarly" | "release" => Ok(ProposalKind::ReleaseEarly),
            "extend_lock" | "ExtendLock" | "extend" => Ok(ProposalKind::ExtendLock),
            other => Err(VaultError::InvalidProposalType(other.to_string())),
        }
    }
}

// ── Proposal ──────────────────────────────────────────────────────────────────

/// Result of the single terminal execution of a proposal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Passed,
    Rejected,
}

/// Lifecycle phase of a proposal at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalPhase {
    /// `start_time <= now <= end_time`: votes accepted.
    Open,
    /// Past `end_time`, not yet executed.
    Closed,
    Executed,
}

/// A time-boxed request to modify the proposer's own custody record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: AccountId,
    /// Asset of the proposer's record when the proposal was created.
    pub asset_id: AssetId,
    pub kind: ProposalKind,
    pub parameter: Balance,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub yes_weight: Balance,
    pub no_weight: Balance,
    pub executed: bool,
    pub outcome: Option<ExecutionOutcome>,
}

impl Proposal {
    pub fn phase(&self, now: Timestamp) -> ProposalPhase {
        if self.executed {
            ProposalPhase::Executed
        } else if now > self.end_time {
            ProposalPhase::Closed
        } else {
            ProposalPhase::Open
        }
    }

    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    /// Strict majority of weight; a tie fails.
    pub fn passes(&self) -> bool {
        self.yes_weight > self.no_weight
    }
}

// ── VoteRecord ────────────────────────────────────────────────────────────────

/// One voter's ballot on one proposal. Its presence is the "already voted" marker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: AccountId,
    pub support: bool,
    pub weight: Balance,
    pub cast_at: Timestamp,
}
