//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two amounts of
/// 100 centavos are the same amount. To "modify" one, build a new one.
///
/// Constructors are expected to validate, so holding a value object is proof
/// that its invariants hold (e.g. an `Amount` is always positive).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
