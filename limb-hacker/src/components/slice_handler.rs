use hecs::Entity;

/// Marks a hackable character as able to be sliced. Removed from fragments so they can't be sliced again.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SliceHandler {
    /// If the character lives inside another object (eg. a character controller), fragments are moved
    /// out of it so they stay put when the controller moves.
    pub encapsulating_entity: Option<Entity>,
}
