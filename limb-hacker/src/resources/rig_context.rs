use std::collections::HashMap;

use hecs::{Entity, World};
use log::{debug, info};

use crate::{
    archetype::{ArchetypeId, RigArchetype},
    bone::BoneHash,
    systems::bone_catalog::BoneCatalog,
    util::Hierarchy,
};

/// What limb-hacker needs to know about a character from the avatar system that builds it.
///
/// Characters are built asynchronously: switching archetype marks the character dirty, and its bones
/// and recipe only settle once every asset has streamed in. Callers poll [`RigContext::is_dirty`] and
/// [`RigContext::skeleton`] rather than waiting.
pub trait RigContext {
    /// The character's root entity
    fn root(&self) -> Entity;
    /// The archetype the character is meant to be
    fn active_archetype(&self) -> &RigArchetype;
    /// The archetype the character's built data actually reflects. Lags behind
    /// [`RigContext::active_archetype`] while assets are loading.
    fn resolved_archetype(&self) -> Option<ArchetypeId>;
    /// Is the character still being (re)built?
    fn is_dirty(&self) -> bool;
    /// The built skeleton, once there is one
    fn skeleton(&self) -> Option<&dyn Skeleton>;
}

/// Bone lookup on a built skeleton
pub trait Skeleton {
    /// Does the skeleton have a bone with this hash?
    fn has_bone(&self, hash: BoneHash) -> bool;
    /// The entity of the bone with this hash
    fn bone_entity(&self, hash: BoneHash) -> Option<Entity>;
}

/// A skeleton as a plain `hash -> entity` map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonMap {
    bones: HashMap<BoneHash, Entity>,
}

impl SkeletonMap {
    /// Create a skeleton from its bones
    pub fn new(bones: HashMap<BoneHash, Entity>) -> Self {
        Self { bones }
    }
}

impl Skeleton for SkeletonMap {
    fn has_bone(&self, hash: BoneHash) -> bool {
        self.bones.contains_key(&hash)
    }

    fn bone_entity(&self, hash: BoneHash) -> Option<Entity> {
        self.bones.get(&hash).copied()
    }
}

/// A [`RigContext`] for characters whose bone hierarchy lives in the world.
///
/// Models the avatar system's build cycle: [`AvatarRig::change_archetype`] starts a rebuild,
/// [`AvatarRig::finish_build`] completes it.
#[derive(Debug, Clone)]
pub struct AvatarRig {
    root: Entity,
    archetypes: HashMap<ArchetypeId, RigArchetype>,
    active: ArchetypeId,
    resolved: Option<ArchetypeId>,
    dirty: bool,
    skeleton: Option<SkeletonMap>,
}

impl AvatarRig {
    /// Create a rig for the character at `root`. Nothing has been built yet.
    pub fn new(root: Entity, archetype: RigArchetype) -> Self {
        let active = archetype.id;
        let mut archetypes = HashMap::new();
        archetypes.insert(active, archetype);
        Self {
            root,
            archetypes,
            active,
            resolved: None,
            dirty: true,
            skeleton: None,
        }
    }

    /// Make another archetype available to switch to
    pub fn add_archetype(&mut self, archetype: RigArchetype) {
        self.archetypes.insert(archetype.id, archetype);
    }

    /// Start turning the character into another archetype. Unknown archetypes are ignored.
    pub fn change_archetype(&mut self, id: ArchetypeId) -> bool {
        if !self.archetypes.contains_key(&id) {
            debug!("[LIMB_HACKER] Unknown archetype {id:?}, ignoring");
            return false;
        }
        self.active = id;
        self.dirty = true;
        self.skeleton = None;
        true
    }

    /// The build has finished: the data now reflects the active archetype and the skeleton is built
    /// from the bones under the character's skeleton root.
    pub fn finish_build(&mut self, world: &World, skeleton_root_name: &str) {
        let hierarchy = Hierarchy::snapshot(world);
        let skeleton = BoneCatalog::resolve_rig(world, &hierarchy, self.root, skeleton_root_name)
            .map(|catalog| SkeletonMap::new(catalog.into_map()));
        info!(
            "[LIMB_HACKER] Finished building {} with {} bones",
            self.active_archetype().name,
            skeleton.as_ref().map(|s| s.bones.len()).unwrap_or(0)
        );
        self.skeleton = skeleton;
        self.resolved = Some(self.active);
        self.dirty = false;
    }
}

impl RigContext for AvatarRig {
    fn root(&self) -> Entity {
        self.root
    }

    fn active_archetype(&self) -> &RigArchetype {
        &self.archetypes[&self.active]
    }

    fn resolved_archetype(&self) -> Option<ArchetypeId> {
        self.resolved
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn skeleton(&self) -> Option<&dyn Skeleton> {
        self.skeleton.as_ref().map(|s| s as &dyn Skeleton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archetype::Recipe,
        bone::hash_name,
        components::{Info, Parent},
    };

    #[test]
    pub fn test_build_cycle() {
        let mut world = World::new();
        let character = world.spawn((Info::new("Character", 0),));
        let root = world.spawn((Info::new("Root", 1), Parent(character)));
        let hips = world.spawn((Info::new("Hips", 2), Parent(root)));

        let human = RigArchetype::new(ArchetypeId(1), "Human", Recipe::default());
        let elf = RigArchetype::new(ArchetypeId(2), "Elf", Recipe::default());
        let mut rig = AvatarRig::new(character, human);
        rig.add_archetype(elf);
        assert!(rig.is_dirty());
        assert!(rig.skeleton().is_none());

        rig.finish_build(&world, "Root");
        assert!(!rig.is_dirty());
        assert_eq!(rig.resolved_archetype(), Some(ArchetypeId(1)));
        let skeleton = rig.skeleton().unwrap();
        assert!(skeleton.has_bone(hash_name("Hips")));
        assert_eq!(skeleton.bone_entity(hash_name("Hips")), Some(hips));
        assert!(!skeleton.has_bone(hash_name("Root")));

        assert!(!rig.change_archetype(ArchetypeId(3)));
        assert!(rig.change_archetype(ArchetypeId(2)));
        assert!(rig.is_dirty());
        assert!(rig.skeleton().is_none());
        assert_eq!(rig.active_archetype().name, "Elf");
        assert_eq!(rig.resolved_archetype(), Some(ArchetypeId(1)));
    }
}
