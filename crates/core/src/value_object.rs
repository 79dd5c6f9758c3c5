//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Requisition codes and decision records are value objects: two codes with the
/// same prefix and counter are the same code, regardless of where they came from.
/// To "change" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
