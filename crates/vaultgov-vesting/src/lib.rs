//! vaultgov-vesting
//!
//! Pure arithmetic shared by the custody ledger and the governance engine:
//! the linear vesting schedule and the supply-relative voting weight.
//! Nothing here touches storage or the token ledger.

pub mod schedule;
pub mod weight;

pub use schedule::{releasable_amount, vested_amount};
pub use weight::{voting_weight, VotingWeight};
