use crate::error::VaultError;
use crate::types::{AccountId, AssetId, Balance};

/// The external fungible-token ledger the vault takes custody through.
///
/// Implementations report a refused movement (insufficient balance, frozen
/// account, unknown asset) as `VaultError::Transfer` and a failed read as
/// `VaultError::Ledger`. The engine never commits local state unless the
/// call returned `Ok`.
pub trait TokenLedger {
    /// Move `amount` of `asset` from `from` into the vault's custody.
    fn pull(&self, asset: &AssetId, from: &AccountId, amount: Balance) -> Result<(), VaultError>;

    /// Move `amount` of `asset` out of custody to `to`.
    fn push(&self, asset: &AssetId, to: &AccountId, amount: Balance) -> Result<(), VaultError>;

    fn balance_of(&self, asset: &AssetId, who: &AccountId) -> Result<Balance, VaultError>;

    fn total_supply(&self, asset: &AssetId) -> Result<Balance, VaultError>;
}

impl<L: TokenLedger + ?Sized> TokenLedger for std::sync::Arc<L> {
    fn pull(&self, asset: &AssetId, from: &AccountId, amount: Balance) -> Result<(), VaultError> {
        (**self).pull(asset, from, amount)
    }

    fn push(&self, asset: &AssetId, to: &AccountId, amount: Balance) -> Result<(), VaultError> {
        (**self).push(asset, to, amount)
    }

    fn balance_of(&self, asset: &AssetId, who: &AccountId) -> Result<Balance, VaultError> {
        (**self).balance_of(asset, who)
    }

    fn total_supply(&self, asset: &AssetId) -> Result<Balance, VaultError> {
        (**self).total_supply(asset)
    }
}
