use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use vaultgov_core::error::VaultError;
use vaultgov_core::ledger::TokenLedger;
use vaultgov_core::types::{AccountId, AssetId, Balance};

#[derive(Default)]
struct Book {
    balances: HashMap<(AssetId, AccountId), Balance>,
    supply: HashMap<AssetId, Balance>,
    frozen: HashSet<AccountId>,
}

impl Book {
    fn balance(&self, asset: &AssetId, who: &AccountId) -> Balance {
        self.balances
            .get(&(asset.clone(), who.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), VaultError> {
        if self.frozen.contains(from) || self.frozen.contains(to) {
            return Err(VaultError::Transfer("account frozen".into()));
        }
        let have = self.balance(asset, from);
        if have < amount {
            return Err(VaultError::Transfer(format!(
                "insufficient balance: need {amount}, have {have}"
            )));
        }
        self.balances.insert((asset.clone(), from.clone()), have - amount);
        let to_balance = self.balance(asset, to);
        self.balances.insert((asset.clone(), to.clone()), to_balance + amount);
        Ok(())
    }
}

/// A multi-asset token ledger held in memory.
///
/// Tokens pulled into custody are credited to `custodian`. `freeze` makes
/// every transfer touching an account fail, which is how tests exercise
/// rollback on a refused pull or push.
pub struct InMemoryLedger {
    custodian: AccountId,
    book: Mutex<Book>,
}

impl InMemoryLedger {
    pub fn new(custodian: AccountId) -> Self {
        Self { custodian, book: Mutex::new(Book::default()) }
    }

    pub fn custodian(&self) -> &AccountId {
        &self.custodian
    }

    fn book(&self) -> Result<MutexGuard<'_, Book>, VaultError> {
        self.book
            .lock()
            .map_err(|_| VaultError::Ledger("ledger lock poisoned".into()))
    }

    /// Create `amount` new tokens of `asset` for `to`, growing total supply.
    pub fn mint(&self, asset: &AssetId, to: &AccountId, amount: Balance) -> Result<(), VaultError> {
        let mut book = self.book()?;
        let supply = book.supply.get(asset).copied().unwrap_or(0);
        let new_supply = supply.checked_add(amount).ok_or(VaultError::ArithmeticOverflow)?;
        let balance = book.balance(asset, to);
        book.supply.insert(asset.clone(), new_supply);
        book.balances.insert((asset.clone(), to.clone()), balance + amount);
        Ok(())
    }

    pub fn freeze(&self, who: &AccountId) -> Result<(), VaultError> {
        self.book()?.frozen.insert(who.clone());
        Ok(())
    }

    pub fn unfreeze(&self, who: &AccountId) -> Result<(), VaultError> {
        self.book()?.frozen.remove(who);
        Ok(())
    }

    /// Balance held in custody for `asset`.
    pub fn custody_balance(&self, asset: &AssetId) -> Result<Balance, VaultError> {
        Ok(self.book()?.balance(asset, &self.custodian))
    }
}

impl TokenLedger for InMemoryLedger {
    fn pull(&self, asset: &AssetId, from: &AccountId, amount: Balance) -> Result<(), VaultError> {
        let custodian = self.custodian.clone();
        self.book()?.transfer(asset, from, &custodian, amount)
    }

    fn push(&self, asset: &AssetId, to: &AccountId, amount: Balance) -> Result<(), VaultError> {
        let custodian = self.custodian.clone();
        self.book()?.transfer(asset, &custodian, to, amount)
    }

    fn balance_of(&self, asset: &AssetId, who: &AccountId) -> Result<Balance, VaultError> {
        Ok(self.book()?.balance(asset, who))
    }

    fn total_supply(&self, asset: &AssetId) -> Result<Balance, VaultError> {
        Ok(self.book()?.supply.get(asset).copied().unwrap_or(0))
    }
}
