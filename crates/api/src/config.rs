//! Command-line / environment configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use rinha_infra::{AuthorityConfig, PoolConfig, RetryPolicy};
use rinha_observability::LogFormat;

/// Ledger API server.
#[derive(Parser, Debug, Clone)]
#[command(name = "rinha-api", about = "Account ledger HTTP API", version)]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Postgres connection string.
    ///
    /// When omitted, accounts live in memory and nothing survives a restart.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 95)]
    pub max_connections: u32,

    #[arg(long, env = "DB_MIN_CONNECTIONS", default_value_t = 10)]
    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_MS", default_value_t = 1000)]
    pub acquire_timeout_ms: u64,

    /// Deadline for one ledger operation, retries included.
    #[arg(long, env = "LEDGER_DEADLINE_MS", default_value_t = 2000)]
    pub request_timeout_ms: u64,

    /// Ledger operations allowed in flight before new ones are refused.
    #[arg(long, env = "LEDGER_MAX_IN_FLIGHT", default_value_t = 256)]
    pub max_in_flight: usize,

    /// How long an operation may wait for a free slot.
    #[arg(long, env = "LEDGER_QUEUE_TIMEOUT_MS", default_value_t = 100)]
    pub queue_timeout_ms: u64,

    /// Retries after a serialization conflict.
    #[arg(long, env = "LEDGER_MAX_RETRIES", default_value_t = 5)]
    pub max_retries: u32,

    /// Log output: `json` or `pretty`.
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig::default()
            .with_deadline(Duration::from_millis(self.request_timeout_ms))
            .with_max_in_flight(self.max_in_flight)
            .with_queue_timeout(Duration::from_millis(self.queue_timeout_ms))
            .with_retry(RetryPolicy::default().with_max_attempts(self.max_retries))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.max_connections,
            min_connections: self.min_connections.min(self.max_connections),
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            ..PoolConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "rinha-api",
            "--port",
            "9999",
            "--database-url",
            "postgres://admin:123@db/rinha",
            "--max-connections",
            "4",
            "--min-connections",
            "8",
            "--request-timeout-ms",
            "500",
            "--max-retries",
            "0",
            "--log-format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.bind_addr().port(), 9999);
        assert_eq!(cli.database_url.as_deref(), Some("postgres://admin:123@db/rinha"));
        assert_eq!(cli.log_format, LogFormat::Pretty);

        let pool = cli.pool_config();
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 4);

        let authority = cli.authority_config();
        assert_eq!(authority.deadline, Duration::from_millis(500));
        assert!(!authority.retry.should_retry(0));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["rinha-api", "--log-format", "xml"]).is_err());
    }
}
