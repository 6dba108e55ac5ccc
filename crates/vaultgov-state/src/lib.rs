//! vaultgov-state
//!
//! Persistent custody and governance state, and the engine that applies
//! deposits, releases, proposals, votes, and executions to it.

pub mod db;
pub mod engine;
pub mod ledger;

pub use db::{StagedMutations, StateDb};
pub use engine::VaultEngine;
pub use ledger::InMemoryLedger;
