//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined
//! entirely by their attribute values. Two value objects with the same values are
//! considered equal, and a value object never changes after construction; to
//! "modify" one, build a new one.

/// Marker trait for value objects.
///
/// Requires `Clone` (values are cheap to copy), `PartialEq` (compared by
/// attribute values) and `Debug` (loggable/testable).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
