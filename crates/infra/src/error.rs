//! Infrastructure and authority error types.

use std::time::Duration;

use thiserror::Error;

use rinha_core::DomainError;

/// Storage operation error.
///
/// These are **infrastructure errors** (I/O, pool capacity, serialization
/// failures) as opposed to domain errors (validation, the credit limit).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage engine aborted the unit of work because of a concurrent
    /// writer (serialization failure, deadlock). Safe to retry as a whole.
    #[error("serialization conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or has no capacity left (pool closed,
    /// pool acquire timed out, network failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other storage failure (bad row, constraint violation, ...).
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Error returned by [`crate::authority::BalanceAuthority`].
///
/// Callers branch on the variant to pick a user-visible outcome:
/// `Validation`, `NotFound` and `LimitExceeded` are precise and final, every
/// other variant is an internal failure that never implies success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("account not found")]
    NotFound,

    /// Business-rule rejection. Carries the unchanged, pre-operation balance.
    #[error("limit exceeded (limite: {limite}, saldo: {saldo})")]
    LimitExceeded { limite: i64, saldo: i64 },

    /// Concurrent-writer conflicts persisted after every retry.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or had no connection to spare.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused or failed the operation in a way a retry will not fix.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Capacity exhausted; the request was refused without being queued.
    #[error("too many operations in flight")]
    Overloaded,
}

impl LedgerError {
    /// Whether the same request may succeed if submitted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Conflict(_)
                | LedgerError::Unavailable(_)
                | LedgerError::Timeout(_)
                | LedgerError::Overloaded
        )
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => LedgerError::Validation(msg),
            DomainError::NotFound => LedgerError::NotFound,
            DomainError::LimitExceeded { limite, saldo } => LedgerError::LimitExceeded { limite, saldo },
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            StoreError::Unavailable(msg) => LedgerError::Unavailable(msg),
            StoreError::Storage(msg) => LedgerError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_outcomes_are_not_retryable() {
        assert!(!LedgerError::Validation("x".into()).is_retryable());
        assert!(!LedgerError::NotFound.is_retryable());
        assert!(!LedgerError::LimitExceeded { limite: 1, saldo: 0 }.is_retryable());
        assert!(LedgerError::Timeout(Duration::from_millis(5)).is_retryable());
        assert!(LedgerError::Overloaded.is_retryable());
    }

    #[test]
    fn only_transient_store_failures_are_retryable() {
        assert!(LedgerError::Unavailable("pool closed".into()).is_retryable());
        assert!(!LedgerError::Storage("check constraint violated".into()).is_retryable());

        let err: LedgerError = StoreError::Storage("bad row".into()).into();
        assert!(!err.is_retryable());
        let err: LedgerError = StoreError::Unavailable("pool timed out".into()).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn store_conflicts_stay_conflicts() {
        let err: LedgerError = StoreError::Conflict("40001".into()).into();
        assert_eq!(err, LedgerError::Conflict("40001".into()));

        let err: LedgerError = StoreError::Unavailable("pool closed".into()).into();
        assert_eq!(err, LedgerError::Unavailable("pool closed".into()));

        let err: LedgerError = StoreError::Storage("bad row".into()).into();
        assert_eq!(err, LedgerError::Storage("bad row".into()));
    }
}
