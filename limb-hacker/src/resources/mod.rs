/// The rig (avatar) a hackable character is built by
pub mod rig_context;

pub use rig_context::{AvatarRig, RigContext, Skeleton, SkeletonMap};
