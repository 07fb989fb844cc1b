use std::collections::HashMap;

use hecs::{Entity, World};
use id_arena::{Arena, Id};
use log::debug;

use crate::{
    bone::{hash_name, BoneHash, BoneIdentity},
    resources::RigContext,
    util::{name_of, Hierarchy},
};

/// A bone found while walking a rig's hierarchy
#[derive(Debug, Clone)]
pub struct BoneNode {
    /// The bone's identity
    pub identity: BoneIdentity,
    /// The bone's entity
    pub entity: Entity,
    /// The node of the parent bone, if the parent is in the catalog
    pub parent: Option<Id<BoneNode>>,
}

/// Every named bone beneath a rig's skeleton root, keyed by the hash of its name.
pub struct BoneCatalog {
    nodes: Arena<BoneNode>,
    by_hash: HashMap<BoneHash, Id<BoneNode>>,
    order: Vec<Id<BoneNode>>,
}

impl BoneCatalog {
    /// Walk the hierarchy beneath `skeleton_root` (not including it), depth first.
    ///
    /// When two bones share a name the first one wins and the rest are ignored - that's an authoring
    /// mistake, but not one worth failing over.
    pub fn resolve(world: &World, hierarchy: &Hierarchy, skeleton_root: Entity) -> Self {
        let mut catalog = BoneCatalog {
            nodes: Arena::new(),
            by_hash: HashMap::new(),
            order: Vec::new(),
        };
        let mut entity_nodes: HashMap<Entity, Id<BoneNode>> = HashMap::new();
        let root_hash = hash_name(&name_of(world, skeleton_root));

        for entity in hierarchy.descendants(skeleton_root) {
            let name = name_of(world, entity);
            let hash = hash_name(&name);
            if catalog.by_hash.contains_key(&hash) {
                debug!("[LIMB_HACKER] Ignoring duplicate bone {name}");
                continue;
            }

            let parent_entity = hierarchy.parent(entity);
            let parent = parent_entity.and_then(|p| entity_nodes.get(&p).copied());
            let parent_hash = match parent {
                Some(id) => Some(catalog.nodes[id].identity.hash),
                None if parent_entity == Some(skeleton_root) => Some(root_hash),
                None => parent_entity.map(|p| hash_name(&name_of(world, p))),
            };

            let id = catalog.nodes.alloc(BoneNode {
                identity: BoneIdentity {
                    name,
                    hash,
                    parent_hash,
                },
                entity,
                parent,
            });
            entity_nodes.insert(entity, id);
            catalog.by_hash.insert(hash, id);
            catalog.order.push(id);
        }

        catalog
    }

    /// Resolve the bones of `rig`, whose skeleton root is a child of the rig's root entity named
    /// `skeleton_root_name`. Returns `None` if the skeleton root hasn't been created yet.
    pub fn resolve_rig(
        world: &World,
        hierarchy: &Hierarchy,
        rig_root: Entity,
        skeleton_root_name: &str,
    ) -> Option<Self> {
        let skeleton_root = hierarchy.find_child(world, rig_root, skeleton_root_name)?;
        Some(Self::resolve(world, hierarchy, skeleton_root))
    }

    /// The entity of the bone with this hash
    pub fn get(&self, hash: BoneHash) -> Option<Entity> {
        self.node(hash).map(|n| n.entity)
    }

    /// The node of the bone with this hash
    pub fn node(&self, hash: BoneHash) -> Option<&BoneNode> {
        self.by_hash.get(&hash).map(|id| &self.nodes[*id])
    }

    /// The parent node of `node`
    pub fn parent(&self, node: &BoneNode) -> Option<&BoneNode> {
        node.parent.map(|id| &self.nodes[id])
    }

    /// Every bone, in the order they were found
    pub fn iter(&self) -> impl Iterator<Item = &BoneNode> {
        self.order.iter().map(|id| &self.nodes[*id])
    }

    /// Number of bones in the catalog
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Is the catalog empty?
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consume the catalog, leaving a plain `hash -> entity` map
    pub fn into_map(self) -> HashMap<BoneHash, Entity> {
        self.by_hash
            .into_iter()
            .map(|(hash, id)| (hash, self.nodes[id].entity))
            .collect()
    }
}

/// Turn a selection of bone identities into the bone entities of a live rig.
///
/// The rig's built skeleton is the most accurate source and is preferred. If the skeleton hasn't been
/// built yet but the bone hierarchy exists (eg. it was baked into the scene) the hierarchy is walked
/// instead. If neither exists there is nothing to resolve against and `None` is returned.
/// Selected bones the rig doesn't have are skipped.
pub fn resolve_severables(
    world: &World,
    rig: &dyn RigContext,
    skeleton_root_name: &str,
    selection: &[BoneIdentity],
) -> Option<Vec<Entity>> {
    if let Some(skeleton) = rig.skeleton() {
        return Some(
            selection
                .iter()
                .filter(|bone| skeleton.has_bone(bone.hash))
                .filter_map(|bone| skeleton.bone_entity(bone.hash))
                .collect(),
        );
    }

    let hierarchy = Hierarchy::snapshot(world);
    let catalog = BoneCatalog::resolve_rig(world, &hierarchy, rig.root(), skeleton_root_name)?;
    Some(
        selection
            .iter()
            .filter_map(|bone| catalog.get(bone.hash))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archetype::{ArchetypeId, Recipe, RigArchetype},
        components::{Info, Parent},
        resources::AvatarRig,
    };

    fn spawn_bone(world: &mut World, name: &str, node_id: usize, parent: Entity) -> Entity {
        world.spawn((Info::new(name, node_id), Parent(parent)))
    }

    fn archetype() -> RigArchetype {
        RigArchetype::new(ArchetypeId(1), "Human", Recipe::default())
    }

    #[test]
    pub fn test_resolve_skips_root_and_ignores_duplicates() {
        let mut world = World::new();
        let character = world.spawn((Info::new("Character", 0),));
        let root = spawn_bone(&mut world, "Root", 1, character);
        let global = spawn_bone(&mut world, "Global", 2, root);
        let hips = spawn_bone(&mut world, "Hips", 3, global);
        let first_leg = spawn_bone(&mut world, "LeftLeg", 4, hips);
        let _second_leg = spawn_bone(&mut world, "LeftLeg", 5, hips);

        let hierarchy = Hierarchy::snapshot(&world);
        let catalog = BoneCatalog::resolve_rig(&world, &hierarchy, character, "Root").unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.get(hash_name("Root")).is_none());
        assert_eq!(catalog.get(hash_name("LeftLeg")), Some(first_leg));

        let names: Vec<_> = catalog.iter().map(|n| n.identity.name.as_str()).collect();
        assert_eq!(names, vec!["Global", "Hips", "LeftLeg"]);

        let leg = catalog.node(hash_name("LeftLeg")).unwrap();
        assert_eq!(leg.identity.parent_hash, Some(hash_name("Hips")));
        assert_eq!(catalog.parent(leg).map(|p| p.entity), Some(hips));
        let global_node = catalog.node(hash_name("Global")).unwrap();
        assert_eq!(global_node.identity.parent_hash, Some(hash_name("Root")));
        assert!(catalog.parent(global_node).is_none());
    }

    #[test]
    pub fn test_partial_hierarchy() {
        let mut world = World::new();
        let character = world.spawn((Info::new("Character", 0),));
        let hierarchy = Hierarchy::snapshot(&world);
        assert!(BoneCatalog::resolve_rig(&world, &hierarchy, character, "Root").is_none());

        spawn_bone(&mut world, "Root", 1, character);
        let hierarchy = Hierarchy::snapshot(&world);
        let catalog = BoneCatalog::resolve_rig(&world, &hierarchy, character, "Root").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    pub fn test_resolve_severables_prefers_skeleton() {
        let mut world = World::new();
        let character = world.spawn((Info::new("Character", 0),));
        let mut rig = AvatarRig::new(character, archetype());
        let selection = vec![BoneIdentity::new("Hips"), BoneIdentity::new("Tail")];

        // Nothing built yet: deferred
        assert!(resolve_severables(&world, &rig, "Root", &selection).is_none());

        // Hierarchy exists, skeleton doesn't: walk it
        let root = spawn_bone(&mut world, "Root", 1, character);
        let hips = spawn_bone(&mut world, "Hips", 2, root);
        assert_eq!(
            resolve_severables(&world, &rig, "Root", &selection),
            Some(vec![hips])
        );

        // Skeleton built: it wins, even over a hierarchy that has since changed
        rig.finish_build(&world, "Root");
        let impostor = spawn_bone(&mut world, "Hips", 0, root);
        assert_eq!(
            resolve_severables(&world, &rig, "Root", &selection),
            Some(vec![hips])
        );
        assert_ne!(impostor, hips);
    }
}
