use std::sync::Arc;

use tracing::{debug, info, warn};

use vaultgov_core::custody::{CustodyRecord, CustodyState};
use vaultgov_core::error::VaultError;
use vaultgov_core::event::{ReleaseSource, VaultEvent};
use vaultgov_core::ledger::TokenLedger;
use vaultgov_core::params::{VaultParams, WeightAssetSource};
use vaultgov_core::proposal::{ExecutionOutcome, Proposal, ProposalKind, VoteRecord};
use vaultgov_core::types::{AccountId, AssetId, Balance, ProposalId, Timestamp};
use vaultgov_vesting::{releasable_amount, voting_weight};

use crate::db::{StagedMutations, StateDb};

/// Tokens to send out of custody once an operation has been validated.
struct Payout {
    asset_id: AssetId,
    to: AccountId,
    amount: Balance,
}

// ── VaultEngine ───────────────────────────────────────────────────────────────

/// The custody ledger and governance engine over one `StateDb`.
///
/// Each operation validates, stages its writes, performs the token-ledger
/// call, and only then commits. A refused transfer leaves no local change
/// and a failed validation makes no transfer. Callers must serialize
/// operations; the engine holds no locks of its own.
pub struct VaultEngine<L: TokenLedger> {
    pub db: Arc<StateDb>,
    pub ledger: L,
    pub params: VaultParams,
}

impl<L: TokenLedger> VaultEngine<L> {
    pub fn new(db: Arc<StateDb>, ledger: L, params: VaultParams) -> Result<Self, VaultError> {
        params.validate()?;
        Ok(Self { db, ledger, params })
    }

    // ── Custody ledger ────────────────────────────────────────────────────────

    /// Take `amount` of `asset_id` into custody for `depositor`.
    ///
    /// A depositor holds at most one active record. An exhausted record is
    /// moved to history and replaced.
    pub fn deposit(
        &self,
        depositor: &AccountId,
        asset_id: &AssetId,
        amount: Balance,
        lock_duration_secs: i64,
        vesting_duration_secs: i64,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if lock_duration_secs < self.params.min_lock_duration_secs {
            return Err(VaultError::LockDurationTooShort {
                min_secs: self.params.min_lock_duration_secs,
            });
        }
        if vesting_duration_secs < 0 {
            return Err(VaultError::InvalidVestingDuration);
        }
        now.checked_add(lock_duration_secs)
            .and_then(|t| t.checked_add(vesting_duration_secs))
            .ok_or(VaultError::ArithmeticOverflow)?;

        let mut staged = StagedMutations::default();
        match self.db.custody_state(depositor)? {
            CustodyState::Active(_) => return Err(VaultError::DuplicateLock),
            CustodyState::Exhausted(old) => staged.archived.push(old),
            CustodyState::NoRecord => {}
        }

        staged.custody.push(CustodyRecord::new(
            depositor.clone(),
            asset_id.clone(),
            amount,
            now,
            lock_duration_secs,
            vesting_duration_secs,
        ));
        staged.events.push(VaultEvent::Locked {
            depositor: depositor.clone(),
            asset_id: asset_id.clone(),
            amount,
            lock_duration_secs,
            vesting_duration_secs,
        });

        if let Err(e) = self.ledger.pull(asset_id, depositor, amount) {
            warn!(%depositor, amount, error = %e, "deposit pull refused");
            return Err(e);
        }
        if let Err(e) = self.db.commit(&staged, now) {
            // Hand the pulled tokens back so custody matches the store.
            if let Err(refund) = self.ledger.push(asset_id, depositor, amount) {
                warn!(%depositor, amount, error = %refund, "deposit refund failed after commit error");
            }
            return Err(e);
        }

        info!(%depositor, asset = %asset_id, amount, lock_duration_secs, vesting_duration_secs, "tokens locked");
        Ok(())
    }

    /// Pay out everything vested since the last release. Returns the amount paid.
    pub fn release_vested(&self, depositor: &AccountId, now: Timestamp) -> Result<Balance, VaultError> {
        let mut record = self.active_record(depositor)?;
        if now < record.lock_end() {
            return Err(VaultError::LockNotElapsed { unlock_at: record.lock_end() });
        }

        let amount = releasable_amount(&record, now);
        debug!(%depositor, releasable = amount, released = record.released_amount, "vesting computed");
        if amount == 0 {
            return Err(VaultError::NothingToRelease);
        }
        record.released_amount += amount;

        let payout = Payout {
            asset_id: record.asset_id.clone(),
            to: depositor.clone(),
            amount,
        };
        let exhausted = !record.is_active();
        let mut staged = StagedMutations::default();
        staged.custody.push(record);
        staged.events.push(VaultEvent::Released {
            depositor: depositor.clone(),
            amount,
            source: ReleaseSource::Vesting,
        });

        self.pay_and_commit(&staged, Some(payout), now)?;
        info!(%depositor, amount, exhausted, "vested tokens released");
        Ok(amount)
    }

    /// `total - released` for the depositor's record; zero when there is none.
    pub fn view_remaining(&self, depositor: &AccountId) -> Result<Balance, VaultError> {
        Ok(self.db.custody_state(depositor)?.remaining())
    }

    /// What `release_vested` would pay at `now`, without changing anything.
    pub fn releasable(&self, depositor: &AccountId, now: Timestamp) -> Result<Balance, VaultError> {
        Ok(match self.db.custody_state(depositor)? {
            CustodyState::Active(record) => releasable_amount(&record, now),
            _ => 0,
        })
    }

    fn active_record(&self, depositor: &AccountId) -> Result<CustodyRecord, VaultError> {
        self.db
            .custody_state(depositor)?
            .active()
            .ok_or_else(|| VaultError::NoActiveLock(depositor.to_string()))
    }

    /// Apply a passed proposal to its target record. Reachable only from `execute`.
    fn adjust_custody(
        &self,
        depositor: &AccountId,
        kind: ProposalKind,
        parameter: Balance,
        staged: &mut StagedMutations,
    ) -> Result<Option<Payout>, VaultError> {
        // ReleaseEarly needs an active record; ExtendLock applies to whatever is stored.
        let mut record = match kind {
            ProposalKind::ReleaseEarly => self.active_record(depositor)?,
            ProposalKind::ExtendLock => self
                .db
                .get_custody(depositor)?
                .ok_or_else(|| VaultError::NoActiveLock(depositor.to_string()))?,
        };
        let payout = match kind {
            ProposalKind::ReleaseEarly => {
                let released = record
                    .released_amount
                    .checked_add(parameter)
                    .filter(|r| *r <= record.total_amount)
                    .ok_or(VaultError::ExceedsTotal)?;
                record.released_amount = released;
                staged.events.push(VaultEvent::Released {
                    depositor: depositor.clone(),
                    amount: parameter,
                    source: ReleaseSource::Governance,
                });
                Some(Payout {
                    asset_id: record.asset_id.clone(),
                    to: depositor.clone(),
                    amount: parameter,
                })
            }
            ProposalKind::ExtendLock => {
                let added = i64::try_from(parameter).map_err(|_| VaultError::ArithmeticOverflow)?;
                let extended = record
                    .lock_duration_secs
                    .checked_add(added)
                    .ok_or(VaultError::ArithmeticOverflow)?;
                record
                    .lock_start
                    .checked_add(extended)
                    .and_then(|t| t.checked_add(record.vesting_duration_secs))
                    .ok_or(VaultError::ArithmeticOverflow)?;
                record.lock_duration_secs = extended;
                staged.events.push(VaultEvent::LockExtended {
                    depositor: depositor.clone(),
                    added_secs: added,
                    new_lock_duration_secs: extended,
                });
                None
            }
        };
        staged.custody.push(record);
        Ok(payout)
    }

    fn pay_and_commit(
        &self,
        staged: &StagedMutations,
        payout: Option<Payout>,
        now: Timestamp,
    ) -> Result<(), VaultError> {
        if let Some(p) = payout {
            if let Err(e) = self.ledger.push(&p.asset_id, &p.to, p.amount) {
                warn!(to = %p.to, amount = p.amount, error = %e, "custody push refused");
                return Err(e);
            }
        }
        self.db.commit(staged, now)
    }

    // ── Governance engine ─────────────────────────────────────────────────────

    /// Open a proposal against the proposer's own active record.
    pub fn propose(
        &self,
        proposer: &AccountId,
        kind: ProposalKind,
        parameter: Balance,
        now: Timestamp,
    ) -> Result<ProposalId, VaultError> {
        let record = self
            .db
            .custody_state(proposer)?
            .active()
            .ok_or_else(|| VaultError::NotAnActiveLocker(proposer.to_string()))?;
        let end_time = now
            .checked_add(self.params.voting_window_secs)
            .ok_or(VaultError::ArithmeticOverflow)?;

        let id = self.db.next_proposal_id()?;
        let proposal = Proposal {
            id,
            proposer: proposer.clone(),
            asset_id: record.asset_id,
            kind,
            parameter,
            start_time: now,
            end_time,
            yes_weight: 0,
            no_weight: 0,
            executed: false,
            outcome: None,
        };

        let mut staged = StagedMutations::default();
        staged.proposals.push(proposal);
        staged.next_proposal_id = Some(id + 1);
        staged.events.push(VaultEvent::ProposalCreated {
            proposal_id: id,
            proposer: proposer.clone(),
            kind,
            parameter,
            end_time,
        });
        self.db.commit(&staged, now)?;

        info!(proposal_id = id, %proposer, %kind, parameter, end_time, "proposal created");
        Ok(id)
    }

    /// `propose` with the kind given by name, e.g. `"release_early"`.
    pub fn propose_named(
        &self,
        proposer: &AccountId,
        kind: &str,
        parameter: Balance,
        now: Timestamp,
    ) -> Result<ProposalId, VaultError> {
        let kind: ProposalKind = kind.parse()?;
        self.propose(proposer, kind, parameter, now)
    }

    /// Cast `voter`'s weight for or against a proposal. Returns the weight.
    pub fn vote(
        &self,
        proposal_id: ProposalId,
        voter: &AccountId,
        support: bool,
        now: Timestamp,
    ) -> Result<Balance, VaultError> {
        let mut proposal = self
            .db
            .get_proposal(proposal_id)?
            .ok_or(VaultError::ProposalNotFound(proposal_id))?;
        if !proposal.accepts_votes(now) {
            return Err(VaultError::VotingClosed);
        }
        if self.db.has_voted(proposal_id, voter)? {
            return Err(VaultError::AlreadyVoted);
        }

        let weight = self.weigh(&proposal, voter)?;
        if support {
            proposal.yes_weight = proposal
                .yes_weight
                .checked_add(weight)
                .ok_or(VaultError::ArithmeticOverflow)?;
        } else {
            proposal.no_weight = proposal
                .no_weight
                .checked_add(weight)
                .ok_or(VaultError::ArithmeticOverflow)?;
        }

        let mut staged = StagedMutations::default();
        staged.proposals.push(proposal);
        staged.votes.push(VoteRecord {
            proposal_id,
            voter: voter.clone(),
            support,
            weight,
            cast_at: now,
        });
        staged.events.push(VaultEvent::VoteCast {
            proposal_id,
            voter: voter.clone(),
            support,
            weight,
        });
        self.db.commit(&staged, now)?;

        info!(proposal_id, %voter, support, weight, "vote cast");
        Ok(weight)
    }

    /// Point-in-time weight of `voter` on `proposal`.
    fn weigh(&self, proposal: &Proposal, voter: &AccountId) -> Result<Balance, VaultError> {
        let voter_state = self.db.custody_state(voter)?;
        let asset_id = match self.params.weight_asset {
            WeightAssetSource::ProposalAsset => proposal.asset_id.clone(),
            WeightAssetSource::VoterAsset => voter_state
                .record()
                .map(|r| r.asset_id.clone())
                .ok_or(VaultError::NoVotingPower)?,
        };

        // Only the voter's own custody in the same asset is excluded from supply.
        let locked = match &voter_state {
            CustodyState::Active(r) if r.asset_id == asset_id => r.remaining(),
            _ => 0,
        };
        let balance = self.ledger.balance_of(&asset_id, voter)?;
        let supply = self.ledger.total_supply(&asset_id)?;

        let w = voting_weight(balance, locked, supply, self.params.weight_scale)?;
        debug!(
            %voter,
            balance,
            locked,
            circulating = w.circulating_supply,
            weight = w.weight,
            "voting weight computed"
        );
        Ok(w.weight)
    }

    /// Settle a proposal after its window closes.
    ///
    /// A passing proposal is applied to the proposer's record; if that fails
    /// the error is returned and the proposal stays unexecuted. A rejected
    /// proposal is marked executed without touching custody.
    pub fn execute(&self, proposal_id: ProposalId, now: Timestamp) -> Result<ExecutionOutcome, VaultError> {
        let mut proposal = self
            .db
            .get_proposal(proposal_id)?
            .ok_or(VaultError::ProposalNotFound(proposal_id))?;
        if now <= proposal.end_time {
            return Err(VaultError::VotingNotOver { ends_at: proposal.end_time });
        }
        if proposal.executed {
            return Err(VaultError::AlreadyExecuted);
        }

        let mut staged = StagedMutations::default();
        let (outcome, payout) = if proposal.passes() {
            let payout = self.adjust_custody(
                &proposal.proposer,
                proposal.kind,
                proposal.parameter,
                &mut staged,
            )?;
            (ExecutionOutcome::Passed, payout)
        } else {
            (ExecutionOutcome::Rejected, None)
        };

        proposal.executed = true;
        proposal.outcome = Some(outcome);
        let (yes, no) = (proposal.yes_weight, proposal.no_weight);
        staged.proposals.push(proposal);
        staged.events.push(VaultEvent::ProposalExecuted { proposal_id, outcome });

        self.pay_and_commit(&staged, payout, now)?;
        info!(proposal_id, ?outcome, yes, no, "proposal executed");
        Ok(outcome)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
