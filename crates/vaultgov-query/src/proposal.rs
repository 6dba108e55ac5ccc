use vaultgov_core::error::VaultError;
use vaultgov_core::proposal::{ExecutionOutcome, Proposal, ProposalPhase, VoteRecord};
use vaultgov_core::types::{ProposalId, Timestamp};
use vaultgov_state::StateDb;

use crate::format_ts;

/// Query helpers for governance proposals.
pub struct ProposalQuery<'a> {
    db: &'a StateDb,
}

impl<'a> ProposalQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn get(&self, id: ProposalId) -> Result<Option<Proposal>, VaultError> {
        self.db.get_proposal(id)
    }

    pub fn phase(&self, id: ProposalId, now: Timestamp) -> Result<ProposalPhase, VaultError> {
        Ok(self.require(id)?.phase(now))
    }

    /// Whether the proposal would pass if the tally stopped now.
    pub fn would_pass(&self, id: ProposalId) -> Result<bool, VaultError> {
        Ok(self.require(id)?.passes())
    }

    pub fn votes(&self, id: ProposalId) -> Result<Vec<VoteRecord>, VaultError> {
        self.db.votes_for(id)
    }

    pub fn describe(&self, id: ProposalId, now: Timestamp) -> Result<String, VaultError> {
        let p = self.require(id)?;
        let ballots = self.db.votes_for(id)?.len();

        let status = match (p.phase(now), p.outcome) {
            (ProposalPhase::Open, _) => {
                let hours = (p.end_time - now) / 3_600;
                format!("Open until {} ({}h left)", format_ts(p.end_time), hours)
            }
            (ProposalPhase::Closed, _) => {
                let verdict = if p.passes() { "passing" } else { "failing" };
                format!("Closed {} ({}), awaiting execution", format_ts(p.end_time), verdict)
            }
            (ProposalPhase::Executed, Some(ExecutionOutcome::Passed)) => "Executed: passed".into(),
            (ProposalPhase::Executed, _) => "Executed: rejected".into(),
        };

        Ok(format!(
            "Proposal #{} | {} {} by {} | yes {} / no {} ({} ballots) | {}",
            p.id, p.kind, p.parameter, p.proposer, p.yes_weight, p.no_weight, ballots, status
        ))
    }

    fn require(&self, id: ProposalId) -> Result<Proposal, VaultError> {
        self.db.get_proposal(id)?.ok_or(VaultError::ProposalNotFound(id))
    }
}
