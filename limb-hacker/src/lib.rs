#![deny(missing_docs)]

//! Runtime dismemberment for skinned, bone-rigged characters. 🔪
//!
//! `limb-hacker` takes a character living in a [`hecs::World`] (a hierarchy of bone entities, a
//! skinned renderer and the usual physics components), decides which bones can be severed, slices the
//! skinned mesh at those bones and turns each severed piece into its own ragdoll fragment while the
//! remaining body keeps animating.
//!
//! # Getting started
//! Add a [`components::Hackable`] to your character's root entity, hand a [`resources::RigContext`] for
//! the character to [`LimbHacker::update`] every frame and call [`LimbHacker::request_slice`] when your
//! gameplay decides a limb should come off. [`rig_builder::RigBuilder`] will knock up a procedural rig if
//! you just want to see it work.

pub use glam;
pub use hecs;
pub use limb_hacker::{LimbHacker, SliceOutcome, SliceReport, SliceRequest};
pub use limb_hacker_error::LimbHackerError;
pub use rapier3d;

/// Data describing a character template: its mesh slots and the bones they reference
pub mod archetype;
/// Bone identities and the name hash used to compare them
pub mod bone;
/// Components are data attached to entities: hierarchy, skinning, physics and hacking state
pub mod components;
/// Configuration shared by every hackable character
pub mod config;
mod limb_hacker;
mod limb_hacker_error;
/// CPU side skinned mesh data
pub mod mesh;
/// Resources are wrappers around external state the library interacts with, ie. the rig system
pub mod resources;
/// Procedural rigs, handy for tests and demos
pub mod rig_builder;
/// Systems are functions that read and mutate the world to perform each stage of a hack
pub mod systems;
/// Kitchen sink utility functions
pub mod util;

/// limb-hacker result type
pub type LimbHackerResult<T> = std::result::Result<T, LimbHackerError>;

/// Name of the node every skeleton hangs off
pub const SKELETON_ROOT_NAME: &str = "Root";

/// The fixed path from the skeleton root down to the hips. Ragdoll handoff walks it one hop at a time.
pub const RAGDOLL_CHAIN: [&str; 4] = ["Root", "Global", "Position", "Hips"];

/// Physics layer severed fragments are moved to when their source has no physics avatar
pub const DEFAULT_RAGDOLL_LAYER: u32 = 8;

/// Filters that strip the bookkeeping bones most rigs carry from the list of severables
pub const STANDARD_BONE_FILTERS: [&str; 3] = ["Global", "Position", "Adjust"];
