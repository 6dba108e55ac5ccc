//! Supply-relative voting weight.
//!
//!   circulating = total_supply − voter_locked
//!   weight      = voter_balance × scale / circulating
//!
//! `scale` keeps the fraction of the circulating supply representable in
//! integer arithmetic.

use vaultgov_core::error::VaultError;
use vaultgov_core::types::Balance;

/// A computed weight together with the supply it was measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VotingWeight {
    pub weight: Balance,
    pub circulating_supply: Balance,
}

/// Compute a voter's weight.
///
/// # Errors
/// * `ZeroCirculatingSupply` when `total_supply <= locked_balance`.
/// * `ArithmeticOverflow` when `voter_balance × scale` exceeds `u128`.
/// * `NoVotingPower` when the weight truncates to zero.
pub fn voting_weight(
    voter_balance: Balance,
    locked_balance: Balance,
    total_supply: Balance,
    scale: u128,
) -> Result<VotingWeight, VaultError> {
    let circulating_supply = total_supply
        .checked_sub(locked_balance)
        .filter(|c| *c > 0)
        .ok_or(VaultError::ZeroCirculatingSupply)?;

    let weight = voter_balance
        .checked_mul(scale)
        .ok_or(VaultError::ArithmeticOverflow)?
        / circulating_supply;

    if weight == 0 {
        return Err(VaultError::NoVotingPower);
    }
    Ok(VotingWeight { weight, circulating_supply })
}
