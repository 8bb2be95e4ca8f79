//! Account storage boundary.
//!
//! The authority talks to storage only through [`LedgerStore`] and the
//! per-account [`AccountUnit`] it hands out.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::{PostgresLedgerStore, connect_with_retry};
pub use r#trait::{AccountUnit, LedgerStore};
