//! Ledger Entry Store: append-only, per-account ordered log of movements.
//!
//! Two backends share the same contract:
//!
//! - `append` validates the entry and records it; it becomes visible to readers
//!   only once the enclosing account unit commits.
//! - `criado_em` never decreases within an account: an entry is stamped no
//!   earlier than the account's newest one, so timestamp order is write order
//!   even when a clock steps back.
//! - `last_n` returns at most `n` entries, newest first by `criado_em`, with
//!   ties broken by insertion order (higher entry id first). An account with no
//!   movements yields an empty list.
//!
//! Entries are never mutated or deleted here.

pub mod log;
pub mod postgres;

pub use log::EntryLog;
