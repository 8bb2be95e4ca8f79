//! Ledger module (fixed accounts with a credit limit, single-entry movements).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod movement;
pub mod statement;

pub use account::{Account, Balance};
pub use movement::{Amount, Description, Movement, MovementKind, MovementRequest, NewMovement};
pub use statement::{STATEMENT_SIZE, Statement};
