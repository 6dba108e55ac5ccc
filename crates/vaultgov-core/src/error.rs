use thiserror::Error;

use crate::types::{ProposalId, Timestamp};

#[derive(Debug, Error)]
pub enum VaultError {
    // ── Custody errors ───────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("lock duration too short: minimum {min_secs} seconds")]
    LockDurationTooShort { min_secs: i64 },

    #[error("vesting duration must not be negative")]
    InvalidVestingDuration,

    #[error("depositor already has an active lock")]
    DuplicateLock,

    #[error("no active lock for depositor {0}")]
    NoActiveLock(String),

    #[error("lock not yet elapsed (unlocks at {unlock_at})")]
    LockNotElapsed { unlock_at: Timestamp },

    #[error("nothing newly vested to release")]
    NothingToRelease,

    #[error("release would exceed the locked total")]
    ExceedsTotal,

    // ── Governance errors ────────────────────────────────────────────────────
    #[error("invalid proposal type: {0}")]
    InvalidProposalType(String),

    #[error("proposer {0} has no active lock")]
    NotAnActiveLocker(String),

    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("voting window is closed")]
    VotingClosed,

    #[error("voter has already voted on this proposal")]
    AlreadyVoted,

    #[error("voter has no voting power")]
    NoVotingPower,

    #[error("circulating supply is zero")]
    ZeroCirculatingSupply,

    #[error("voting not over (ends at {ends_at})")]
    VotingNotOver { ends_at: Timestamp },

    #[error("proposal already executed")]
    AlreadyExecuted,

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ── External token ledger ────────────────────────────────────────────────
    #[error("token transfer failed: {0}")]
    Transfer(String),

    #[error("token ledger query failed: {0}")]
    Ledger(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

/// Coarse classification of a failure, for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A time window has not opened or has already closed; retrying later may succeed.
    TimeWindow,
    /// The request is structurally invalid for the current state.
    InvalidRequest,
    /// Not enough tokens, vested balance, or voting power.
    InsufficientFunds,
    /// The token ledger or local storage failed; the whole operation may be retried.
    External,
}

impl VaultError {
    pub fn kind(&self) -> ErrorClass {
        use VaultError::*;
        match self {
            LockNotElapsed { .. } | VotingClosed | VotingNotOver { .. } => ErrorClass::TimeWindow,
            NothingToRelease | ExceedsTotal | NoVotingPower | ZeroCirculatingSupply
            | Transfer(_) => ErrorClass::InsufficientFunds,
            Ledger(_) | Serialization(_) | Storage(_) => ErrorClass::External,
            ZeroAmount
            | LockDurationTooShort { .. }
            | InvalidVestingDuration
            | DuplicateLock
            | NoActiveLock(_)
            | InvalidProposalType(_)
            | NotAnActiveLocker(_)
            | ProposalNotFound(_)
            | AlreadyVoted
            | AlreadyExecuted
            | ArithmeticOverflow
            | InvalidParams(_) => ErrorClass::InvalidRequest,
        }
    }
}
