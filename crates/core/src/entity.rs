//! Entities: things with a stable identity whose state changes over time.

use core::fmt;

/// An account keeps its id while its `saldo` moves; a movement keeps its id
/// forever. Ids are small integers, so they are handed out by value.
pub trait Entity {
    type Id: Copy + Ord + fmt::Debug + fmt::Display;

    fn id(&self) -> Self::Id;

    /// Two values describe the same entity, whatever their current state.
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
