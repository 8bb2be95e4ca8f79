use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use rinha_core::{AccountId, EntryId};
use rinha_ledger::{Account, Movement, NewMovement};

use super::r#trait::{AccountUnit, LedgerStore};
use crate::config::default_accounts;
use crate::entries::EntryLog;
use crate::error::StoreError;

#[derive(Debug)]
struct AccountSlot {
    account: Account,
    entries: EntryLog,
}

/// In-memory ledger store.
///
/// Each account sits behind its own async mutex: a unit of work holds the
/// account's guard for its whole lifetime, so writers on the same account are
/// serialized while different accounts proceed in parallel. The account map
/// itself is fixed at construction and needs no lock.
///
/// Intended for tests/dev; nothing survives a restart. Entries are never
/// pruned either, so memory grows with every admitted movement for as long as
/// the process runs.
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    slots: HashMap<AccountId, Arc<Mutex<AccountSlot>>>,
}

impl InMemoryLedgerStore {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let slots = accounts
            .into_iter()
            .map(|account| {
                let slot = AccountSlot {
                    account,
                    entries: EntryLog::new(account.id),
                };
                (account.id, Arc::new(Mutex::new(slot)))
            })
            .collect();

        Self { slots }
    }

    /// Store provisioned with [`default_accounts`].
    pub fn with_default_accounts() -> Self {
        Self::new(default_accounts())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn provisioned_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts = Vec::with_capacity(self.slots.len());
        for slot in self.slots.values() {
            accounts.push(slot.lock().await.account);
        }
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn begin(&self, account_id: AccountId) -> Result<Option<Box<dyn AccountUnit>>, StoreError> {
        let Some(slot) = self.slots.get(&account_id) else {
            return Ok(None);
        };

        let guard = slot.clone().lock_owned().await;
        let account = guard.account;

        Ok(Some(Box::new(InMemoryUnit {
            slot: guard,
            account,
            staged_entries: Vec::new(),
            staged_saldo: None,
        })))
    }

    async fn snapshot(
        &self,
        account_id: AccountId,
        n: usize,
    ) -> Result<Option<(Account, Vec<Movement>)>, StoreError> {
        let Some(slot) = self.slots.get(&account_id) else {
            return Ok(None);
        };

        let guard = slot.lock().await;
        Ok(Some((guard.account, guard.entries.last_n(n))))
    }
}

/// Unit of work holding one account's guard. Writes are staged and applied
/// on commit; dropping the unit discards them.
struct InMemoryUnit {
    slot: OwnedMutexGuard<AccountSlot>,
    account: Account,
    staged_entries: Vec<NewMovement>,
    staged_saldo: Option<i64>,
}

#[async_trait]
impl AccountUnit for InMemoryUnit {
    fn account(&self) -> &Account {
        &self.account
    }

    async fn append_entry(&mut self, entry: NewMovement) -> Result<EntryId, StoreError> {
        self.slot
            .entries
            .check(&entry)
            .map_err(|e| StoreError::Storage(format!("append_entry: {e}")))?;

        let id = EntryId::new(self.slot.entries.next_id().get() + self.staged_entries.len() as i64);
        self.staged_entries.push(entry);
        Ok(id)
    }

    async fn set_balance(&mut self, saldo: i64) -> Result<(), StoreError> {
        // Mirrors the `CHECK (saldo >= -limite)` constraint of the Postgres schema.
        if saldo < -self.account.limite {
            return Err(StoreError::Storage(format!(
                "set_balance: saldo {saldo} below -limite {}",
                self.account.limite
            )));
        }
        self.staged_saldo = Some(saldo);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnit {
            mut slot,
            staged_entries,
            staged_saldo,
            ..
        } = *self;

        for entry in staged_entries {
            slot.entries
                .append(entry)
                .map_err(|e| StoreError::Storage(format!("commit: {e}")))?;
        }
        if let Some(saldo) = staged_saldo {
            slot.account.saldo = saldo;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rinha_ledger::MovementRequest;

    fn entry(account_id: AccountId, valor: i64, tipo: &str) -> NewMovement {
        MovementRequest::parse(account_id, valor, tipo, "t")
            .unwrap()
            .to_entry(Utc::now())
    }

    #[tokio::test]
    async fn unknown_account_opens_no_unit() {
        let store = InMemoryLedgerStore::with_default_accounts();
        assert!(store.begin(AccountId::new(6)).await.unwrap().is_none());
        assert!(store.snapshot(AccountId::new(0), 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_unit_is_visible_in_snapshot() {
        let store = InMemoryLedgerStore::with_default_accounts();
        let id = AccountId::new(1);

        let mut unit = store.begin(id).await.unwrap().unwrap();
        let entry_id = unit.append_entry(entry(id, 300, "d")).await.unwrap();
        unit.set_balance(-300).await.unwrap();
        unit.commit().await.unwrap();

        let (account, movements) = store.snapshot(id, 10).await.unwrap().unwrap();
        assert_eq!(account.saldo, -300);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].id, entry_id);
    }

    #[tokio::test]
    async fn clock_step_back_keeps_write_order() {
        let store = InMemoryLedgerStore::with_default_accounts();
        let id = AccountId::new(3);

        let mut unit = store.begin(id).await.unwrap().unwrap();
        let first = unit.append_entry(entry(id, 10, "c")).await.unwrap();
        unit.commit().await.unwrap();

        let mut stale = entry(id, 20, "c");
        stale.criado_em = stale.criado_em - Duration::milliseconds(5);
        let mut unit = store.begin(id).await.unwrap().unwrap();
        let second = unit.append_entry(stale).await.unwrap();
        unit.commit().await.unwrap();

        let (_, movements) = store.snapshot(id, 10).await.unwrap().unwrap();
        assert_eq!(movements[0].id, second);
        assert_eq!(movements[1].id, first);
        assert!(movements[0].criado_em >= movements[1].criado_em);
    }

    #[tokio::test]
    async fn dropped_unit_leaves_no_trace() {
        let store = InMemoryLedgerStore::with_default_accounts();
        let id = AccountId::new(2);

        {
            let mut unit = store.begin(id).await.unwrap().unwrap();
            unit.append_entry(entry(id, 10, "c")).await.unwrap();
            unit.set_balance(10).await.unwrap();
        }

        let (account, movements) = store.snapshot(id, 10).await.unwrap().unwrap();
        assert_eq!(account.saldo, 0);
        assert!(movements.is_empty());
    }

    #[tokio::test]
    async fn balance_below_limit_is_refused_by_the_store() {
        let store = InMemoryLedgerStore::new([Account {
            id: AccountId::new(1),
            limite: 100,
            saldo: 0,
        }]);
        let mut unit = store.begin(AccountId::new(1)).await.unwrap().unwrap();
        assert!(matches!(
            unit.set_balance(-101).await,
            Err(StoreError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn provisioned_accounts_are_sorted_by_id() {
        let store = InMemoryLedgerStore::with_default_accounts();
        let ids: Vec<i32> = store
            .provisioned_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id.get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }
}
