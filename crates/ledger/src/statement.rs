use chrono::{DateTime, Utc};

use crate::account::Balance;
use crate::movement::Movement;

/// Number of movements shown on a statement.
pub const STATEMENT_SIZE: usize = 10;

/// Read-only snapshot of an account: balance, limit and its latest movements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub balance: Balance,
    /// When the snapshot was taken (not before the movements were read).
    pub queried_at: DateTime<Utc>,
    /// Newest first, at most [`STATEMENT_SIZE`] entries.
    pub last_movements: Vec<Movement>,
}

impl Statement {
    pub fn new(balance: Balance, queried_at: DateTime<Utc>, last_movements: Vec<Movement>) -> Self {
        Self {
            balance,
            queried_at,
            last_movements,
        }
    }
}
