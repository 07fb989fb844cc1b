use hecs::Entity;

/// Component added to indicate that an entity has a parent
/// Used by [`crate::util::Hierarchy`] to rebuild the transform hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parent(pub Entity);
