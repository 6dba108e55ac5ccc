use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::Transactional;
use std::path::Path;

use vaultgov_core::constants::{
    META_NEXT_EVENT_SEQ, META_NEXT_HISTORY_SEQ, META_NEXT_PROPOSAL_ID,
};
use vaultgov_core::custody::{CustodyRecord, CustodyState};
use vaultgov_core::error::VaultError;
use vaultgov_core::event::{EventEnvelope, VaultEvent};
use vaultgov_core::proposal::{Proposal, VoteRecord};
use vaultgov_core::types::{AccountId, ProposalId, Timestamp};

// ── Staged mutations ──────────────────────────────────────────────────────────

/// Every write one operation makes, committed together by `StateDb::commit`.
#[derive(Default, Debug)]
pub struct StagedMutations {
    pub custody: Vec<CustodyRecord>,
    /// Exhausted records moved to history before being replaced.
    pub archived: Vec<CustodyRecord>,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<VoteRecord>,
    pub events: Vec<VaultEvent>,
    pub next_proposal_id: Option<ProposalId>,
}

// ── StateDb ───────────────────────────────────────────────────────────────────

/// Persistent vault state backed by sled.
///
/// Named trees:
///   custody          — AccountId bytes            → bincode(CustodyRecord)
///   custody_history  — AccountId bytes ‖ seq BE   → bincode(CustodyRecord)
///   proposals        — ProposalId BE              → bincode(Proposal)
///   votes            — ProposalId BE ‖ AccountId  → bincode(VoteRecord)
///   events           — seq BE                     → bincode(EventEnvelope)
///   meta             — utf8 key bytes             → u64 BE counters
///
/// Records are only ever inserted or overwritten, never removed.
pub struct StateDb {
    _db: sled::Db,
    custody: sled::Tree,
    custody_history: sled::Tree,
    proposals: sled::Tree,
    votes: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

fn storage(e: sled::Error) -> VaultError {
    VaultError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, VaultError> {
    bincode::serialize(value).map_err(|e| VaultError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, VaultError> {
    bincode::deserialize(bytes).map_err(|e| VaultError::Serialization(e.to_string()))
}

fn decode_counter(bytes: Option<&[u8]>) -> Result<u64, VaultError> {
    match bytes {
        None => Ok(0),
        Some(b) => {
            let arr: [u8; 8] = b
                .try_into()
                .map_err(|_| VaultError::Serialization("counter is not 8 bytes".into()))?;
            Ok(u64::from_be_bytes(arr))
        }
    }
}

fn vote_key(proposal_id: ProposalId, voter: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key.extend_from_slice(voter.as_bytes());
    key
}

fn history_key(depositor: &AccountId, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(depositor.as_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Read and bump a counter inside a transaction.
fn take_counter(
    meta: &TransactionalTree,
    key: &str,
) -> Result<u64, ConflictableTransactionError<VaultError>> {
    let current = meta.get(key.as_bytes())?;
    let value = decode_counter(current.as_deref()).map_err(ConflictableTransactionError::Abort)?;
    meta.insert(key.as_bytes(), &(value + 1).to_be_bytes()[..])?;
    Ok(value)
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VaultError> {
        let db = sled::open(path).map_err(storage)?;
        let custody = db.open_tree("custody").map_err(storage)?;
        let custody_history = db.open_tree("custody_history").map_err(storage)?;
        let proposals = db.open_tree("proposals").map_err(storage)?;
        let votes = db.open_tree("votes").map_err(storage)?;
        let events = db.open_tree("events").map_err(storage)?;
        let meta = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, custody, custody_history, proposals, votes, events, meta })
    }

    // ── Custody ──────────────────────────────────────────────────────────────

    pub fn get_custody(&self, depositor: &AccountId) -> Result<Option<CustodyRecord>, VaultError> {
        match self.custody.get(depositor.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn custody_state(&self, depositor: &AccountId) -> Result<CustodyState, VaultError> {
        Ok(CustodyState::from_record(self.get_custody(depositor)?))
    }

    /// Write a record directly, outside the engine. Used for seeding.
    pub fn put_custody(&self, record: &CustodyRecord) -> Result<(), VaultError> {
        self.custody
            .insert(record.depositor.as_bytes(), encode(record)?)
            .map_err(storage)?;
        Ok(())
    }

    /// Exhausted records previously held by `depositor`, oldest first.
    pub fn custody_history(&self, depositor: &AccountId) -> Result<Vec<CustodyRecord>, VaultError> {
        let mut out = Vec::new();
        for item in self.custody_history.scan_prefix(depositor.as_bytes()) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Proposals ────────────────────────────────────────────────────────────

    pub fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, VaultError> {
        match self.proposals.get(id.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Identifier the next proposal will receive.
    pub fn next_proposal_id(&self) -> Result<ProposalId, VaultError> {
        let bytes = self.meta.get(META_NEXT_PROPOSAL_ID.as_bytes()).map_err(storage)?;
        decode_counter(bytes.as_deref())
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    // ── Votes ────────────────────────────────────────────────────────────────

    pub fn get_vote(
        &self,
        proposal_id: ProposalId,
        voter: &AccountId,
    ) -> Result<Option<VoteRecord>, VaultError> {
        match self.votes.get(vote_key(proposal_id, voter)).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn has_voted(&self, proposal_id: ProposalId, voter: &AccountId) -> Result<bool, VaultError> {
        self.votes
            .contains_key(vote_key(proposal_id, voter))
            .map_err(storage)
    }

    pub fn votes_for(&self, proposal_id: ProposalId) -> Result<Vec<VoteRecord>, VaultError> {
        let mut out = Vec::new();
        for item in self.votes.scan_prefix(proposal_id.to_be_bytes()) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// All notifications with sequence number `>= from_seq`, in order.
    pub fn events_since(&self, from_seq: u64) -> Result<Vec<EventEnvelope>, VaultError> {
        let mut out = Vec::new();
        for item in self.events.range(from_seq.to_be_bytes()..) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Apply `staged` in one multi-tree transaction: all writes land or none do.
    pub fn commit(&self, staged: &StagedMutations, now: Timestamp) -> Result<(), VaultError> {
        let custody: Vec<(Vec<u8>, Vec<u8>)> = staged
            .custody
            .iter()
            .map(|r| Ok((r.depositor.as_bytes().to_vec(), encode(r)?)))
            .collect::<Result<_, VaultError>>()?;
        let archived: Vec<(&AccountId, Vec<u8>)> = staged
            .archived
            .iter()
            .map(|r| Ok((&r.depositor, encode(r)?)))
            .collect::<Result<_, VaultError>>()?;
        let proposals: Vec<(Vec<u8>, Vec<u8>)> = staged
            .proposals
            .iter()
            .map(|p| Ok((p.id.to_be_bytes().to_vec(), encode(p)?)))
            .collect::<Result<_, VaultError>>()?;
        let votes: Vec<(Vec<u8>, Vec<u8>)> = staged
            .votes
            .iter()
            .map(|v| Ok((vote_key(v.proposal_id, &v.voter), encode(v)?)))
            .collect::<Result<_, VaultError>>()?;

        (
            &self.custody,
            &self.custody_history,
            &self.proposals,
            &self.votes,
            &self.events,
            &self.meta,
        )
            .transaction(|(custody_tx, history_tx, proposals_tx, votes_tx, events_tx, meta_tx)| {
                for (depositor, bytes) in &archived {
                    let seq = take_counter(meta_tx, META_NEXT_HISTORY_SEQ)?;
                    history_tx.insert(history_key(depositor, seq), bytes.as_slice())?;
                }
                for (key, bytes) in &custody {
                    custody_tx.insert(key.as_slice(), bytes.as_slice())?;
                }
                for (key, bytes) in &proposals {
                    proposals_tx.insert(key.as_slice(), bytes.as_slice())?;
                }
                for (key, bytes) in &votes {
                    votes_tx.insert(key.as_slice(), bytes.as_slice())?;
                }
                if let Some(next) = staged.next_proposal_id {
                    meta_tx.insert(META_NEXT_PROPOSAL_ID.as_bytes(), &next.to_be_bytes()[..])?;
                }
                for event in &staged.events {
                    let seq = take_counter(meta_tx, META_NEXT_EVENT_SEQ)?;
                    let envelope = EventEnvelope { seq, at: now, event: event.clone() };
                    let bytes = encode(&envelope).map_err(ConflictableTransactionError::Abort)?;
                    events_tx.insert(&seq.to_be_bytes()[..], bytes)?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => storage(err),
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), VaultError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}
