//! Runtime configuration for the authority, the Postgres pool and provisioning.

use std::time::Duration;

use rinha_core::AccountId;
use rinha_ledger::{Account, STATEMENT_SIZE};

use crate::retry::RetryPolicy;

/// Accounts provisioned when nothing else is configured: `(id, limite)`.
pub const DEFAULT_ACCOUNTS: [(i32, i64); 5] = [
    (1, 100_000),
    (2, 80_000),
    (3, 1_000_000),
    (4, 10_000_000),
    (5, 500_000),
];

/// The default accounts, each starting at `saldo = 0`.
pub fn default_accounts() -> Vec<Account> {
    DEFAULT_ACCOUNTS
        .iter()
        .map(|&(id, limite)| Account {
            id: AccountId::new(id),
            limite,
            saldo: 0,
        })
        .collect()
}

/// Balance authority configuration.
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Deadline for one unit of work (including conflict retries).
    pub deadline: Duration,
    /// Maximum units of work in flight at once.
    pub max_in_flight: usize,
    /// How long a request may wait for capacity before being refused.
    pub queue_timeout: Duration,
    /// Retry policy for serialization conflicts.
    pub retry: RetryPolicy,
    /// Number of movements returned by a statement.
    pub statement_size: usize,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(2),
            max_in_flight: 256,
            queue_timeout: Duration::from_millis(100),
            retry: RetryPolicy::default(),
            statement_size: STATEMENT_SIZE,
        }
    }
}

impl AuthorityConfig {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Postgres connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a unit of work waits for a pooled connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Startup attempts before giving up on the database.
    pub connect_attempts: u32,
    /// Pause between startup attempts.
    pub connect_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 95,
            min_connections: 10,
            acquire_timeout: Duration::from_secs(1),
            idle_timeout: Duration::from_secs(10 * 60),
            max_lifetime: Duration::from_secs(2 * 60 * 60),
            connect_attempts: 10,
            connect_backoff: Duration::from_secs(5),
        }
    }
}
