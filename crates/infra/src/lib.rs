//! Infrastructure layer: storage backends, the balance authority, config.

pub mod authority;
pub mod config;
pub mod entries;
pub mod error;
pub mod retry;
pub mod store;

pub use authority::BalanceAuthority;
pub use config::{AuthorityConfig, PoolConfig, default_accounts};
pub use error::{LedgerError, StoreError};
pub use retry::{Backoff, RetryPolicy};
