//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures decided by domain rules alone.
///
/// Nothing here depends on I/O: retrying the same input against the same
/// state yields the same error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input (`valor`, `tipo`, `descricao`, ids).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The account is not one of the provisioned accounts.
    #[error("account not found")]
    NotFound,

    /// Applying the movement would push the balance below `-limite`.
    ///
    /// Carries the *pre-operation* balance so callers can see why it failed.
    #[error("limit exceeded (limite: {limite}, saldo: {saldo})")]
    LimitExceeded { limite: i64, saldo: i64 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn limit_exceeded(limite: i64, saldo: i64) -> Self {
        Self::LimitExceeded { limite, saldo }
    }
}
