/// Marker for entities that are switched on
pub mod active;
pub mod avatar;
/// Tag for the root of a severed piece
pub mod fragment;
/// The component that makes a character hackable
pub mod hackable;
/// Names
pub mod info;
/// Hierarchy
pub mod parent;
/// Rigid bodies, colliders and layers
pub mod physics;
/// Bone tables
pub mod skin;
/// Skinned geometry
pub mod skinned_mesh;
/// Marker for characters that can be sliced
pub mod slice_handler;

pub use active::Active;
pub use avatar::{Animator, AvatarBuilder, PhysicsAvatar, UnderConstruction};
pub use fragment::Fragment;
pub use hackable::{ChildOfHackable, Hackable};
pub use info::Info;
pub use parent::Parent;
pub use physics::{BodyType, Collider, PhysicsLayer, RigidBody};
pub use skin::Skin;
pub use skinned_mesh::SkinnedMesh;
pub use slice_handler::SliceHandler;
