//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Documents keep their store identity across updates even though every
/// business field except the assigned number may change.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
