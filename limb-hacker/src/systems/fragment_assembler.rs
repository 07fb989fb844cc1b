use std::{collections::HashMap, fmt::Debug, sync::Arc};

use hecs::{Component, Entity, EntityBuilder, World};
use log::debug;

use crate::{
    components::{
        Active, Animator, AvatarBuilder, ChildOfHackable, Collider, Fragment, Hackable, Info,
        Parent, PhysicsAvatar, PhysicsLayer, RigidBody, Skin, SkinnedMesh, SliceHandler,
        UnderConstruction,
    },
    systems::{ragdoll_handoff::HandoffState, slice::SliceResult},
    util::{deactivate, Hierarchy},
    LimbHackerError, LimbHackerResult,
};

/// What to do to each severed piece: components to strip from its root, and things to attach to it (eg.
/// blood spurts, a despawn timer).
#[derive(Debug, Clone, Default)]
pub struct HackTemplate {
    /// Components removed from the root of each piece
    pub components_to_remove: Vec<ComponentRemoval>,
    /// Entities spawned as children of the root of each piece
    pub prefabs_to_add: Vec<Prefab>,
}

/// Removes one kind of component from an entity
#[derive(Clone, Copy)]
pub struct ComponentRemoval {
    /// A helpful name
    pub name: &'static str,
    remove: fn(&mut World, Entity),
}

impl ComponentRemoval {
    /// Remove components of type `T`
    pub fn of<T: Component>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            remove: |world, entity| {
                let _ = world.remove_one::<T>(entity);
            },
        }
    }

    /// Remove the component from `entity`, if it has one
    pub fn apply(&self, world: &mut World, entity: Entity) {
        (self.remove)(world, entity)
    }
}

impl Debug for ComponentRemoval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ComponentRemoval").field(&self.name).finish()
    }
}

/// Spawns an entity to attach to each severed piece
#[derive(Clone)]
pub struct Prefab {
    /// A helpful name
    pub name: String,
    spawn: Arc<dyn Fn(&mut World) -> Entity + Send + Sync>,
}

impl Prefab {
    /// Create a prefab from a function that spawns it
    pub fn new(name: &str, spawn: impl Fn(&mut World) -> Entity + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            spawn: Arc::new(spawn),
        }
    }

    /// Spawn an instance of the prefab
    pub fn spawn(&self, world: &mut World) -> Entity {
        (self.spawn)(world)
    }
}

impl Debug for Prefab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Prefab").field(&self.name).finish()
    }
}

/// A severed piece, ready for ragdoll handoff
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFragment {
    /// The piece's root entity
    pub root: Entity,
    /// The piece's skinned renderer
    pub renderer: Entity,
    /// The bone (on the source) the piece was cut at
    pub cut_bone: Entity,
    /// The piece's own bones its mesh is weighted to
    pub used_bones: Vec<Entity>,
}

/// Clone every entity in `entities` within `world`. Entity references between them are pointed at the
/// clones, references to anything else are left alone. Returns a map from each entity to its clone.
pub fn clone_hierarchy(
    world: &mut World,
    entities: &[Entity],
) -> LimbHackerResult<HashMap<Entity, Entity>> {
    let entity_map: HashMap<Entity, Entity> = entities
        .iter()
        .copied()
        .zip(world.reserve_entities(entities.len() as u32))
        .collect();
    let remap = |e: Entity| entity_map.get(&e).copied().unwrap_or(e);

    let mut builders = Vec::with_capacity(entities.len());
    for source in entities {
        let mut builder = EntityBuilder::new();
        clone_component::<Info>(world, *source, &mut builder);
        clone_component::<Active>(world, *source, &mut builder);
        clone_component::<SkinnedMesh>(world, *source, &mut builder);
        clone_component::<RigidBody>(world, *source, &mut builder);
        clone_component::<Collider>(world, *source, &mut builder);
        clone_component::<PhysicsLayer>(world, *source, &mut builder);
        clone_component::<Animator>(world, *source, &mut builder);
        clone_component::<AvatarBuilder>(world, *source, &mut builder);
        clone_component::<PhysicsAvatar>(world, *source, &mut builder);
        clone_component::<UnderConstruction>(world, *source, &mut builder);
        clone_component::<SliceHandler>(world, *source, &mut builder);
        clone_component::<Hackable>(world, *source, &mut builder);
        clone_component::<ChildOfHackable>(world, *source, &mut builder);

        if let Ok(parent) = world.get::<&Parent>(*source) {
            builder.add(Parent(remap(parent.0)));
        }

        if let Ok(skin) = world.get::<&Skin>(*source) {
            builder.add(Skin {
                joints: skin.joints.iter().map(|j| remap(*j)).collect(),
            });
        }

        builders.push((remap(*source), builder));
    }

    for (destination, mut builder) in builders {
        world.insert(destination, builder.build())?;
    }

    Ok(entity_map)
}

fn clone_component<T: Component + Clone>(
    world: &World,
    source: Entity,
    builder: &mut EntityBuilder,
) {
    if let Ok(component) = world.get::<&T>(source) {
        builder.add(T::clone(&component));
    }
}

/// Turn each severed mesh of `slice_result` into its own copy of `source`, then give `source` the kept mesh.
///
/// Each copy has the severed mesh swapped in, its skeleton switched off (ragdoll handoff switches on
/// what it needs), `template` applied to its root and a [`ChildOfHackable`] on every collider. If the
/// source lives inside an encapsulating entity, the copy is moved out of it.
pub fn assemble_fragments(
    world: &mut World,
    source: Entity,
    renderer: Entity,
    slice_result: &SliceResult,
    template: &HackTemplate,
    skeleton_root_name: &str,
) -> LimbHackerResult<Vec<AssembledFragment>> {
    let joints = world
        .get::<&Skin>(renderer)
        .map_err(|_| LimbHackerError::missing::<Skin>(renderer))?
        .joints
        .clone();
    if let Some(severed) = slice_result
        .severed
        .iter()
        .find(|s| s.cut_bone >= joints.len())
    {
        return Err(LimbHackerError::InvalidBone {
            index: severed.cut_bone,
            len: joints.len(),
        });
    }

    let hierarchy = Hierarchy::snapshot(world);
    let mut entities = vec![source];
    entities.extend(hierarchy.descendants(source));
    let skeleton_root = hierarchy.find_child(world, source, skeleton_root_name);
    let skeleton: Vec<Entity> = skeleton_root
        .into_iter()
        .chain(skeleton_root.map(|r| hierarchy.descendants(r)).unwrap_or_default())
        .collect();
    let encapsulating = world
        .get::<&SliceHandler>(source)
        .ok()
        .and_then(|handler| handler.encapsulating_entity)
        .filter(|e| hierarchy.is_ancestor(*e, source));

    let mut fragments = Vec::with_capacity(slice_result.severed.len());
    for severed in &slice_result.severed {
        let entity_map = clone_hierarchy(world, &entities)?;
        let root = entity_map[&source];
        let fragment_renderer = entity_map[&renderer];

        world.insert_one(
            fragment_renderer,
            SkinnedMesh::new(severed.fragment.mesh.clone()),
        )?;

        for bone in &skeleton {
            deactivate(world, entity_map[bone]);
        }

        for removal in &template.components_to_remove {
            removal.apply(world, root);
        }

        let mut attached = Vec::with_capacity(template.prefabs_to_add.len());
        for prefab in &template.prefabs_to_add {
            let child = prefab.spawn(world);
            world.insert_one(child, Parent(root))?;
            attached.push(child);
        }

        let mut fragment_entities: Vec<Entity> = entities.iter().map(|e| entity_map[e]).collect();
        fragment_entities.extend(attached);
        link_colliders(world, &fragment_entities, source);

        if let Some(encapsulating) = encapsulating {
            match hierarchy.parent(encapsulating) {
                Some(outer) => world.insert_one(root, Parent(outer))?,
                None => {
                    let _ = world.remove_one::<Parent>(root);
                }
            }
        }

        let cut_bone = joints[severed.cut_bone];
        world.insert_one(
            root,
            Fragment {
                source,
                cut_bone,
                handoff: HandoffState::Disabled,
            },
        )?;

        let used_bones = severed
            .fragment
            .used_bone_indexes
            .iter()
            .filter_map(|i| joints.get(*i))
            // Joints outside the source's hierarchy weren't copied and aren't the fragment's to move
            .filter_map(|j| entity_map.get(j).copied())
            .collect();

        debug!(
            "[LIMB_HACKER] Assembled fragment {root:?} cut at {cut_bone:?} with {} triangles",
            severed.fragment.mesh.triangle_count()
        );
        fragments.push(AssembledFragment {
            root,
            renderer: fragment_renderer,
            cut_bone,
            used_bones,
        });
    }

    world.insert_one(renderer, SkinnedMesh::new(slice_result.kept.mesh.clone()))?;
    Ok(fragments)
}

/// Give every collider beneath a freshly built hackable a [`ChildOfHackable`], so collision handlers can
/// find their way back to it. Returns how many were added.
pub fn on_character_created(world: &mut World, hackable: Entity) -> usize {
    let hierarchy = Hierarchy::snapshot(world);
    let mut entities = vec![hackable];
    entities.extend(hierarchy.descendants(hackable));
    link_colliders(world, &entities, hackable)
}

/// Add a [`ChildOfHackable`] to every entity in `entities` that has a collider and doesn't have one already.
fn link_colliders(world: &mut World, entities: &[Entity], hackable: Entity) -> usize {
    let unlinked: Vec<Entity> = entities
        .iter()
        .copied()
        .filter(|e| {
            world
                .entity(*e)
                .map(|r| r.has::<Collider>() && !r.has::<ChildOfHackable>())
                .unwrap_or(false)
        })
        .collect();

    for entity in &unlinked {
        let _ = world.insert_one(
            *entity,
            ChildOfHackable {
                parent_hackable: hackable,
            },
        );
    }
    unlinked.len()
}
