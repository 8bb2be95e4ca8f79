use std::sync::Arc;

use async_trait::async_trait;

use rinha_core::{AccountId, EntryId};
use rinha_ledger::{Account, Movement, NewMovement};

use crate::error::StoreError;

/// Exclusive, atomic unit of work on one account.
///
/// A unit is obtained from [`LedgerStore::begin`] and holds the account's
/// write scope until it is committed or dropped:
///
/// - No other unit for the same account can be opened while this one lives,
///   so "read saldo, decide, write saldo + append entry" is indivisible.
/// - Writes are invisible to everyone else until [`AccountUnit::commit`]
///   succeeds; they become visible together, never partially.
/// - Dropping a unit without committing discards every staged write and
///   releases the scope. This is the rollback path for rejections, errors,
///   timeouts and cancelled futures alike.
#[async_trait]
pub trait AccountUnit: Send {
    /// Account state as read when the unit was opened.
    fn account(&self) -> &Account;

    /// Append a movement to the account's entry log (staged until commit).
    async fn append_entry(&mut self, entry: NewMovement) -> Result<EntryId, StoreError>;

    /// Set the account's new balance (staged until commit).
    async fn set_balance(&mut self, saldo: i64) -> Result<(), StoreError>;

    /// Make every staged write durable and visible, atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Storage port for the balance authority.
///
/// Implementations scope atomicity to a single account: units on different
/// accounts never block each other.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every provisioned account (fixed at provisioning time).
    async fn provisioned_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Open an exclusive unit of work on `account_id`.
    ///
    /// Returns `Ok(None)` if the account does not exist.
    async fn begin(&self, account_id: AccountId) -> Result<Option<Box<dyn AccountUnit>>, StoreError>;

    /// Consistent read of an account and its `n` most recent entries
    /// (newest first), taken as a single snapshot.
    ///
    /// Returns `Ok(None)` if the account does not exist.
    async fn snapshot(
        &self,
        account_id: AccountId,
        n: usize,
    ) -> Result<Option<(Account, Vec<Movement>)>, StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn provisioned_accounts(&self) -> Result<Vec<Account>, StoreError> {
        (**self).provisioned_accounts().await
    }

    async fn begin(&self, account_id: AccountId) -> Result<Option<Box<dyn AccountUnit>>, StoreError> {
        (**self).begin(account_id).await
    }

    async fn snapshot(
        &self,
        account_id: AccountId,
        n: usize,
    ) -> Result<Option<(Account, Vec<Movement>)>, StoreError> {
        (**self).snapshot(account_id, n).await
    }
}
