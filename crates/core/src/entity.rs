//! Entity trait: identity + continuity across state changes.

/// Something that keeps its identity while its attributes change
/// (a line item accumulating receipts, an approval step receiving its decision).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
