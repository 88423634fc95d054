//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two values with the same attributes are
/// interchangeable. [`crate::Money`] is the canonical example here; products and
/// sale records are entities instead (see [`crate::Entity`]).
///
/// Value objects are immutable; "modifying" one means building a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
