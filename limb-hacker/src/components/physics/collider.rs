use std::fmt::Debug;

pub use rapier3d::prelude::SharedShape;

use super::DEFAULT_COLLISION_GROUP;

/// The shape a bone (or character) collides with, and whether it currently does.
///
/// Bone colliders of an animated character are usually switched off; ragdoll handoff switches on the
/// ones a severed limb needs so it doesn't fall through the floor.
#[derive(Clone)]
pub struct Collider {
    /// Shape, shared with the physics engine
    pub shape: SharedShape,
    /// Switched off colliders are ignored by collision detection
    pub enabled: bool,
    /// Collision groups this collider belongs to
    pub collision_groups: u32,
}

// SharedShape isn't Debug, so print its type instead
impl Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("shape", &self.shape.shape_type())
            .field("enabled", &self.enabled)
            .field("collision_groups", &self.collision_groups)
            .finish()
    }
}

impl Collider {
    /// An enabled collider in the default group
    pub fn new(shape: SharedShape) -> Collider {
        Collider {
            shape,
            ..Default::default()
        }
    }

    /// A collider that waits to be switched on
    pub fn disabled(shape: SharedShape) -> Collider {
        Collider {
            shape,
            enabled: false,
            ..Default::default()
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            shape: SharedShape::ball(0.1),
            enabled: true,
            collision_groups: DEFAULT_COLLISION_GROUP,
        }
    }
}
