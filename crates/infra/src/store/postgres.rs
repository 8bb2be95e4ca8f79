//! Postgres-backed ledger store.
//!
//! One row per account in `clientes(id, limite, saldo)` and the append-only
//! `transacoes` relation keyed by `cliente_id` (see `sql/schema.sql`).
//!
//! ## Isolation
//!
//! A unit of work is a transaction that starts with
//! `SELECT ... FROM clientes WHERE id = $1 FOR UPDATE`. The row lock serializes
//! writers of the same account for the whole read-decide-write sequence and
//! leaves other accounts untouched. Statements read inside a
//! `REPEATABLE READ, READ ONLY` transaction so the balance and the entry list
//! come from one snapshot without blocking writers.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (serialization failure) | `40001` | `Conflict` | Concurrent transaction won |
//! | Database (deadlock detected) | `40P01` | `Conflict` | Lock cycle broken by the server |
//! | Database (other) | Any other | `Storage` | Constraint violations, bad SQL, ... |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unavailable` | No connection available |
//! | Other | N/A | `Storage` | Decode failures, protocol errors |
//!
//! ## Thread Safety
//!
//! `PostgresLedgerStore` is `Send + Sync`; the SQLx pool handles connection
//! sharing. Dropping an uncommitted transaction rolls it back.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{info, instrument, warn};

use rinha_core::{AccountId, EntryId};
use rinha_ledger::{Account, Movement, NewMovement};

use super::r#trait::{AccountUnit, LedgerStore};
use crate::config::PoolConfig;
use crate::entries::postgres as entries;
use crate::error::StoreError;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Open a connection pool, retrying while the database comes up.
pub async fn connect_with_retry(database_url: &str, config: &PoolConfig) -> Result<PgPool, StoreError> {
    let options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime);

    let attempts = config.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match options.clone().connect(database_url).await {
            Ok(pool) => {
                info!(attempt, "connected to postgres");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(
                    attempt,
                    attempts,
                    error = %e,
                    "failed to connect to postgres, retrying in {:?}",
                    config.connect_backoff
                );
                attempt += 1;
                tokio::time::sleep(config.connect_backoff).await;
            }
            Err(e) => return Err(map_sqlx_error("connect", e)),
        }
    }
}

/// Postgres-backed ledger store.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    /// Create a new PostgresLedgerStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the tables if missing and provision the default accounts.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), err)]
    async fn provisioned_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query("SELECT id, limite, saldo FROM clientes ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("provisioned_accounts", e))?;

        rows.iter().map(account_from_row).collect()
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn begin(&self, account_id: AccountId) -> Result<Option<Box<dyn AccountUnit>>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query("SELECT id, limite, saldo FROM clientes WHERE id = $1 FOR UPDATE")
            .bind(account_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_account", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        let account = account_from_row(&row)?;
        Ok(Some(Box::new(PgAccountUnit { tx, account })))
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn snapshot(
        &self,
        account_id: AccountId,
        n: usize,
    ) -> Result<Option<(Account, Vec<Movement>)>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let row = sqlx::query("SELECT id, limite, saldo FROM clientes WHERE id = $1")
            .bind(account_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("read_account", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        let account = account_from_row(&row)?;
        let movements = entries::last_n(&mut *tx, account_id, n).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Some((account, movements)))
    }
}

/// Unit of work bound to an open transaction holding the account row lock.
struct PgAccountUnit {
    tx: Transaction<'static, Postgres>,
    account: Account,
}

#[async_trait]
impl AccountUnit for PgAccountUnit {
    fn account(&self) -> &Account {
        &self.account
    }

    async fn append_entry(&mut self, entry: NewMovement) -> Result<EntryId, StoreError> {
        entries::append(&mut *self.tx, &entry).await
    }

    async fn set_balance(&mut self, saldo: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE clientes SET saldo = $1 WHERE id = $2")
            .bind(saldo)
            .bind(self.account.id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_balance", e))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Storage(format!(
                "set_balance: expected 1 row for account {}, updated {}",
                self.account.id,
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("failed to read account row: {e}"));

    Ok(Account {
        id: AccountId::new(row.try_get("id").map_err(read)?),
        limite: row.try_get("limite").map_err(read)?,
        saldo: row.try_get("saldo").map_err(read)?,
    })
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("i/o error in {}: {}", operation, e)),
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
