/// Collision shapes
pub mod collider;
/// Bodies in the simulation
pub mod rigid_body;

pub use collider::{Collider, SharedShape};
pub use rigid_body::{BodyType, RigidBody};

/// Collision group bones and bodies are members of unless told otherwise
pub const DEFAULT_COLLISION_GROUP: u32 = 0b01;

/// Physics layer of an entity. Fragments are moved to the ragdoll layer so they don't collide with the
/// body they were cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicsLayer(pub u32);
