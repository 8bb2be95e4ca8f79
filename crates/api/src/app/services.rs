use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use rinha_infra::store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, connect_with_retry};
use rinha_infra::{AuthorityConfig, BalanceAuthority, default_accounts};

use crate::app::SharedAuthority;
use crate::config::Cli;

/// Pick the store from the configuration and bootstrap the authority over it.
///
/// With a `DATABASE_URL` the Postgres schema is created (and seeded) if missing;
/// without one the default accounts are provisioned in memory.
pub async fn build_authority(cli: &Cli) -> anyhow::Result<SharedAuthority> {
    let store: Arc<dyn LedgerStore> = match &cli.database_url {
        Some(url) => {
            let pool = connect_with_retry(url, &cli.pool_config())
                .await
                .context("failed to connect to postgres")?;
            let store = PostgresLedgerStore::new(pool);
            store
                .ensure_schema()
                .await
                .context("failed to apply the ledger schema")?;
            info!("using postgres ledger store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory ledger store");
            Arc::new(InMemoryLedgerStore::new(default_accounts()))
        }
    };

    let authority = BalanceAuthority::bootstrap(store, cli.authority_config())
        .await
        .context("failed to load provisioned accounts")?;
    Ok(Arc::new(authority))
}

/// In-memory authority over the default accounts (tests and local runs).
pub fn in_memory_authority(config: AuthorityConfig) -> SharedAuthority {
    let accounts = default_accounts();
    let ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
    let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new(accounts));
    Arc::new(BalanceAuthority::new(store, ids, config))
}
