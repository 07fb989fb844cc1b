#![allow(missing_docs)]
pub mod bone_catalog;
pub mod fragment_assembler;
pub mod ragdoll_handoff;
pub mod severable_selector;
pub mod slice;

pub use bone_catalog::{resolve_severables, BoneCatalog};
pub use fragment_assembler::{
    assemble_fragments, clone_hierarchy, on_character_created, AssembledFragment,
    ComponentRemoval, HackTemplate, Prefab,
};
pub use ragdoll_handoff::{HandoffState, RagdollHandoff};
pub use severable_selector::{available_bones, ArchetypeCheck, SeverableSelector};
pub use slice::{slice, slice_at, BoneTree, FragmentMesh, InfillMode, SeveredMesh, SliceResult};
