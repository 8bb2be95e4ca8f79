//! Account Balance Authority: the sole writer of `saldo`.
//!
//! Every credit/debit goes through the same pipeline:
//!
//! ```text
//! Received
//!   ↓  validate (pure: provisioned id, valor > 0, tipo ∈ {c, d}, 1..=10 chars)
//! Validated
//!   ↓  acquire capacity (bounded wait, then Overloaded)
//!   ↓  open the account's unit of work (exclusive per account)
//!   ↓  Account::admit against the saldo read inside the unit
//! Admitted ──→ append entry + set saldo + commit (all or nothing)
//! Rejected ──→ drop the unit (nothing written), report the pre-operation balance
//! ```
//!
//! A serialization conflict reported by the store restarts the whole unit of
//! work under the configured [`RetryPolicy`](crate::retry::RetryPolicy). The
//! deadline covers every attempt; when it fires the in-flight unit is dropped,
//! which rolls it back.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, instrument, warn};

use rinha_core::AccountId;
use rinha_ledger::{Balance, MovementRequest, Statement};

use crate::config::AuthorityConfig;
use crate::error::LedgerError;
use crate::store::LedgerStore;

/// Arbitrates credit/debit requests against `saldo >= -limite`.
///
/// Generic over the store so tests run against [`crate::store::InMemoryLedgerStore`]
/// and production against [`crate::store::PostgresLedgerStore`] with the same code.
#[derive(Debug)]
pub struct BalanceAuthority<S> {
    store: S,
    accounts: BTreeSet<AccountId>,
    permits: Arc<Semaphore>,
    config: AuthorityConfig,
}

impl<S> BalanceAuthority<S> {
    pub fn new(store: S, accounts: impl IntoIterator<Item = AccountId>, config: AuthorityConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            store,
            accounts: accounts.into_iter().collect(),
            permits,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn is_provisioned(&self, account_id: AccountId) -> bool {
        self.accounts.contains(&account_id)
    }

    /// `Received -> Validated`. Pure; never touches storage.
    pub fn validate(
        &self,
        account_id: AccountId,
        valor: i64,
        tipo: &str,
        descricao: &str,
    ) -> Result<MovementRequest, LedgerError> {
        if !self.is_provisioned(account_id) {
            return Err(LedgerError::NotFound);
        }
        Ok(MovementRequest::parse(account_id, valor, tipo, descricao)?)
    }
}

impl<S: LedgerStore> BalanceAuthority<S> {
    /// Build an authority over every account the store has provisioned.
    pub async fn bootstrap(store: S, config: AuthorityConfig) -> Result<Self, LedgerError> {
        let accounts = store.provisioned_accounts().await?;
        info!(accounts = accounts.len(), "balance authority ready");
        Ok(Self::new(store, accounts.into_iter().map(|a| a.id), config))
    }

    /// Validate raw fields and apply the movement.
    ///
    /// Returns the account's `limite` and the post-operation `saldo`.
    pub async fn apply_movement(
        &self,
        account_id: AccountId,
        valor: i64,
        tipo: &str,
        descricao: &str,
    ) -> Result<Balance, LedgerError> {
        let request = self.validate(account_id, valor, tipo, descricao)?;
        self.apply(request).await
    }

    /// Apply an already validated movement.
    #[instrument(
        skip_all,
        fields(
            account_id = %request.account_id,
            tipo = %request.kind,
            valor = request.amount.get()
        )
    )]
    pub async fn apply(&self, request: MovementRequest) -> Result<Balance, LedgerError> {
        if !self.is_provisioned(request.account_id) {
            return Err(LedgerError::NotFound);
        }

        let _permit = self.acquire_permit().await?;
        let request = &request;
        let result = self
            .with_deadline(self.with_retry("apply_movement", move || self.try_apply(request)))
            .await;

        match &result {
            Ok(balance) => debug!(saldo = balance.saldo, "movement admitted"),
            Err(LedgerError::LimitExceeded { limite, saldo }) => {
                debug!(limite, saldo, "movement rejected: limit exceeded")
            }
            Err(e) if e.is_retryable() => warn!(error = %e, "movement failed"),
            Err(e @ LedgerError::Storage(_)) => error!(error = %e, "movement failed"),
            Err(e) => debug!(error = %e, "movement refused"),
        }
        result
    }

    /// Balance, limit and the latest movements (newest first) as one snapshot.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn statement(&self, account_id: AccountId) -> Result<Statement, LedgerError> {
        if !self.is_provisioned(account_id) {
            return Err(LedgerError::NotFound);
        }

        let _permit = self.acquire_permit().await?;
        let n = self.config.statement_size;
        let store = &self.store;
        let (account, movements) = self
            .with_deadline(self.with_retry("statement", move || async move {
                store
                    .snapshot(account_id, n)
                    .await?
                    .ok_or(LedgerError::NotFound)
            }))
            .await
            .inspect_err(|e| {
                if e.is_retryable() {
                    warn!(error = %e, "statement failed");
                }
            })?;

        // Entry stamps may come from another clock; never report a query time
        // older than the newest movement listed.
        let now = Utc::now();
        let queried_at = movements.first().map_or(now, |m| m.criado_em.max(now));
        Ok(Statement::new(account.balance(), queried_at, movements))
    }

    /// One attempt of the read-decide-write sequence inside a unit of work.
    async fn try_apply(&self, request: &MovementRequest) -> Result<Balance, LedgerError> {
        let mut unit = self
            .store
            .begin(request.account_id)
            .await?
            .ok_or(LedgerError::NotFound)?;

        // A rejection returns here and drops the unit: nothing is written.
        let balance = unit.account().admit(request)?;

        unit.append_entry(request.to_entry(Utc::now())).await?;
        unit.set_balance(balance.saldo).await?;
        unit.commit().await?;

        Ok(balance)
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, LedgerError> {
        let acquire = self.permits.clone().acquire_owned();
        match tokio::time::timeout(self.config.queue_timeout, acquire).await {
            Ok(Ok(permit)) => Ok(permit),
            _ => {
                warn!(
                    max_in_flight = self.config.max_in_flight,
                    "capacity exhausted, refusing request"
                );
                Err(LedgerError::Overloaded)
            }
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut attempt_once: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let policy = &self.config.retry;
        let mut attempt = 0;
        loop {
            match attempt_once().await {
                Err(LedgerError::Conflict(msg)) if policy.should_retry(attempt) => {
                    attempt += 1;
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(operation, attempt, ?delay, conflict = %msg, "serialization conflict, retrying");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn with_deadline<T>(
        &self,
        work: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        let deadline = self.config.deadline;
        match tokio::time::timeout(deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(deadline)),
        }
    }
}
