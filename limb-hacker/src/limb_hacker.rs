use hecs::{Entity, World};
use log::{debug, info, warn};

use crate::{
    components::{Hackable, Skin, SkinnedMesh},
    config::HackerConfig,
    resources::RigContext,
    systems::{
        assemble_fragments, on_character_created, resolve_severables,
        severable_selector::ArchetypeCheck, slice_at, BoneTree, HandoffState, RagdollHandoff,
    },
    util::{has_name, name_of, Hierarchy},
    LimbHackerError, LimbHackerResult,
};

/// A request to cut limbs off a hackable character
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRequest {
    /// The character's root entity, carrying a [`Hackable`]
    pub hackable: Entity,
    /// The bones to cut at. Empty means every severable bone of the character.
    pub targets: Vec<Entity>,
}

impl SliceRequest {
    /// Cut `hackable` at `targets`
    pub fn new(hackable: Entity, targets: Vec<Entity>) -> Self {
        Self { hackable, targets }
    }

    /// Cut `hackable` at every one of its severable bones
    pub fn everything(hackable: Entity) -> Self {
        Self::new(hackable, Vec::new())
    }
}

/// What became of a [`SliceRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum SliceOutcome {
    /// The rig is still being built. Nothing was touched; ask again later.
    Deferred,
    /// The slice went ahead
    Sliced(SliceReport),
}

/// The pieces a slice produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceReport {
    /// The root entity of each severed piece
    pub fragments: Vec<Entity>,
    /// How far each piece got handing itself over to physics, one per fragment
    pub states: Vec<HandoffState>,
    /// Requested bones that couldn't be cut at
    pub skipped: Vec<Entity>,
}

/// Runs hacking for every character. Create one, feed it each character's [`RigContext`] every frame
/// with [`LimbHacker::update`], and ask it to [`LimbHacker::request_slice`] when a limb should come off.
#[derive(Debug, Clone, Default)]
pub struct LimbHacker {
    config: HackerConfig,
}

impl LimbHacker {
    /// Create a new `LimbHacker`
    pub fn new(config: HackerConfig) -> Self {
        Self { config }
    }

    /// The settings in use
    pub fn config(&self) -> &HackerConfig {
        &self.config
    }

    /// Set up the [`Hackable`] on `rig`'s root once the character has been created: pick up its
    /// archetype, resolve its selected bones and link its colliders back to it.
    pub fn init_hackable(
        &self,
        world: &mut World,
        rig: &dyn RigContext,
    ) -> LimbHackerResult<ArchetypeCheck> {
        let root = rig.root();
        let check = {
            let mut hackable = hackable_mut(world, root)?;
            hackable.selector.init(rig, &self.config.filters())
        };
        self.sync_severables(world, rig)?;
        let linked = on_character_created(world, root);
        debug!(
            "[LIMB_HACKER] Initialised {} ({linked} colliders linked)",
            name_of(world, root)
        );
        Ok(check)
    }

    /// Keep the [`Hackable`] on `rig`'s root in step with the rig. Call it every frame.
    ///
    /// If the rig has switched archetype and finished building, the selection is rebuilt for the new
    /// archetype and the severable bones resolved again. Severable bones that have been despawned are
    /// dropped.
    pub fn update(
        &self,
        world: &mut World,
        rig: &dyn RigContext,
    ) -> LimbHackerResult<ArchetypeCheck> {
        let root = rig.root();
        let check = {
            let mut hackable = hackable_mut(world, root)?;
            hackable
                .selector
                .check_for_archetype_change(rig, &self.config.filters())
        };

        if check == ArchetypeCheck::Changed {
            self.sync_severables(world, rig)?;
        }

        let stale: Vec<Entity> = hackable_mut(world, root)?
            .severables
            .iter()
            .copied()
            .filter(|e| !world.contains(*e))
            .collect();
        if !stale.is_empty() {
            debug!("[LIMB_HACKER] Dropping {} stale severables", stale.len());
            let mut hackable = hackable_mut(world, root)?;
            for entity in stale {
                hackable.remove_severable(entity);
            }
        }

        Ok(check)
    }

    /// Turn the selected bones of the [`Hackable`] on `rig`'s root into the rig's bone entities. Returns
    /// false, leaving the severables alone, if the rig has no bones to resolve against yet.
    pub fn sync_severables(
        &self,
        world: &mut World,
        rig: &dyn RigContext,
    ) -> LimbHackerResult<bool> {
        let root = rig.root();
        let selected = hackable_mut(world, root)?.selector.selected().to_vec();
        let resolved = match resolve_severables(
            world,
            rig,
            &self.config.skeleton_root_name,
            &selected,
        ) {
            Some(resolved) => resolved,
            None => {
                debug!(
                    "[LIMB_HACKER] {} has no bones yet, leaving severables alone",
                    name_of(world, root)
                );
                return Ok(false);
            }
        };

        if resolved.len() < selected.len() {
            warn!(
                "[LIMB_HACKER] Only {} of {} selected bones exist on {}",
                resolved.len(),
                selected.len(),
                name_of(world, root)
            );
        }
        hackable_mut(world, root)?.severables = resolved;
        Ok(true)
    }

    /// Cut the requested limbs off a character and turn each into a ragdoll.
    ///
    /// Nothing is touched unless the whole request can go ahead: if the rig is still building, or has
    /// no skeleton to cut (neither a built one nor a skeleton root in the world), the request is
    /// [`SliceOutcome::Deferred`], and if the character or its mesh is broken an error is returned.
    /// Requested bones that aren't severable, or that the mesh isn't skinned to, are skipped.
    pub fn request_slice(
        &self,
        world: &mut World,
        rig: &dyn RigContext,
        request: &SliceRequest,
    ) -> LimbHackerResult<SliceOutcome> {
        if rig.is_dirty() || rig.resolved_archetype() != Some(rig.active_archetype().id) {
            debug!("[LIMB_HACKER] Rig isn't ready, deferring slice");
            return Ok(SliceOutcome::Deferred);
        }
        let hierarchy = Hierarchy::snapshot(world);
        if rig.skeleton().is_none()
            && hierarchy
                .find_child(world, rig.root(), &self.config.skeleton_root_name)
                .is_none()
        {
            debug!(
                "[LIMB_HACKER] {} has no skeleton yet, deferring slice",
                name_of(world, rig.root())
            );
            return Ok(SliceOutcome::Deferred);
        }

        let source = request.hackable;
        let (severables, infill, template) = {
            let hackable = world
                .get::<&Hackable>(source)
                .map_err(|_| LimbHackerError::missing::<Hackable>(source))?;
            (
                hackable.severables.clone(),
                hackable.infill,
                hackable.template.clone(),
            )
        };
        let renderer = find_renderer(world, source, self.config.renderer_name.as_deref())
            .ok_or(LimbHackerError::NoRenderer(source))?;
        let (skin, mesh) = {
            let skin = world.get::<&Skin>(renderer)?;
            let mesh = world.get::<&SkinnedMesh>(renderer)?;
            (Skin::clone(&skin), mesh.data.clone())
        };

        let targets = if request.targets.is_empty() {
            &severables
        } else {
            &request.targets
        };
        let mut report = SliceReport::default();
        let mut cuts = Vec::new();
        for target in targets {
            match skin.index_of(*target) {
                Some(index) if severables.contains(target) => cuts.push(index),
                _ => {
                    warn!(
                        "[LIMB_HACKER] {} can't be cut at {}",
                        name_of(world, source),
                        name_of(world, *target)
                    );
                    report.skipped.push(*target);
                }
            }
        }
        if cuts.is_empty() {
            return Ok(SliceOutcome::Sliced(report));
        }

        let bone_tree = BoneTree::from_hierarchy(&hierarchy, &skin.joints);
        let slice_result = slice_at(&mesh, &bone_tree, &cuts, infill)?;

        let fragments = assemble_fragments(
            world,
            source,
            renderer,
            &slice_result,
            &template,
            &self.config.skeleton_root_name,
        )?;

        for fragment in fragments {
            let mut handoff =
                RagdollHandoff::begin(world, fragment.root, fragment.used_bones, &self.config);
            report.states.push(handoff.run(world));
            report.fragments.push(fragment.root);

            if let Ok(mut hackable) = world.get::<&mut Hackable>(source) {
                hackable.remove_severable(fragment.cut_bone);
            }
        }

        info!(
            "[LIMB_HACKER] Hacked {} fragments off {}",
            report.fragments.len(),
            name_of(world, source)
        );
        Ok(SliceOutcome::Sliced(report))
    }
}

fn hackable_mut(world: &World, entity: Entity) -> LimbHackerResult<hecs::RefMut<'_, Hackable>> {
    world
        .get::<&mut Hackable>(entity)
        .map_err(|_| LimbHackerError::missing::<Hackable>(entity))
}

/// The first skinned renderer beneath `hackable` (depth first), optionally only one named `name`
fn find_renderer(world: &World, hackable: Entity, name: Option<&str>) -> Option<Entity> {
    let hierarchy = Hierarchy::snapshot(world);
    std::iter::once(hackable)
        .chain(hierarchy.descendants(hackable))
        .find(|e| {
            let is_renderer = world
                .entity(*e)
                .map(|r| r.has::<Skin>() && r.has::<SkinnedMesh>())
                .unwrap_or(false);
            is_renderer && name.map_or(true, |name| has_name(world, *e, name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archetype::ArchetypeId, bone::BoneIdentity, components::Info, resources::AvatarRig,
        rig_builder::RigBuilder,
    };

    #[test]
    pub fn test_find_renderer() {
        let mut world = World::new();
        let mut builder = RigBuilder::humanoid("Human", ArchetypeId(1));
        builder.renderer_name("UMARenderer");
        let rig = builder.build(&mut world);
        assert_eq!(find_renderer(&world, rig.root, None), Some(rig.renderer));
        assert_eq!(
            find_renderer(&world, rig.root, Some("UMARenderer")),
            Some(rig.renderer)
        );
        assert_eq!(find_renderer(&world, rig.root, Some("Hair")), None);
        assert_eq!(find_renderer(&world, rig.skeleton_root, None), None);
    }

    #[test]
    pub fn test_missing_hackable() {
        let mut world = World::new();
        let rig = RigBuilder::humanoid("Human", ArchetypeId(1)).build(&mut world);
        let mut avatar = AvatarRig::new(rig.root, rig.archetype.clone());
        avatar.finish_build(&world, "Root");

        let hacker = LimbHacker::default();
        assert!(matches!(
            hacker.update(&mut world, &avatar),
            Err(LimbHackerError::MissingComponent { component: "Hackable", .. })
        ));
        assert!(matches!(
            hacker.request_slice(&mut world, &avatar, &SliceRequest::everything(rig.root)),
            Err(LimbHackerError::MissingComponent { .. })
        ));
    }

    #[test]
    pub fn test_stale_severables_are_dropped() {
        let mut world = World::new();
        let rig = RigBuilder::humanoid("Human", ArchetypeId(1)).build(&mut world);
        world.insert_one(rig.root, Hackable::default()).unwrap();
        let mut avatar = AvatarRig::new(rig.root, rig.archetype.clone());
        avatar.finish_build(&world, "Root");

        let hacker = LimbHacker::default();
        hacker.init_hackable(&mut world, &avatar).unwrap();
        {
            let mut hackable = world.get::<&mut Hackable>(rig.root).unwrap();
            hackable.selector.select(BoneIdentity::new("LeftLeg"));
            hackable.selector.select(BoneIdentity::new("RightLeg"));
        }
        assert!(hacker.sync_severables(&mut world, &avatar).unwrap());
        assert_eq!(world.get::<&Hackable>(rig.root).unwrap().severables.len(), 2);

        let gone = world.spawn((Info::new("Gone", 0),));
        world.get::<&mut Hackable>(rig.root).unwrap().add_severable(gone);
        world.despawn(gone).unwrap();

        assert_eq!(
            hacker.update(&mut world, &avatar).unwrap(),
            ArchetypeCheck::Unchanged
        );
        assert_eq!(
            world.get::<&Hackable>(rig.root).unwrap().severables,
            vec![rig.bone("LeftLeg").unwrap(), rig.bone("RightLeg").unwrap()]
        );
    }

    /// A rig that claims to be ready but has never built a skeleton
    struct UnbuiltRig {
        root: Entity,
        archetype: crate::archetype::RigArchetype,
    }

    impl RigContext for UnbuiltRig {
        fn root(&self) -> Entity {
            self.root
        }

        fn active_archetype(&self) -> &crate::archetype::RigArchetype {
            &self.archetype
        }

        fn resolved_archetype(&self) -> Option<ArchetypeId> {
            Some(self.archetype.id)
        }

        fn is_dirty(&self) -> bool {
            false
        }

        fn skeleton(&self) -> Option<&dyn crate::resources::Skeleton> {
            None
        }
    }

    #[test]
    pub fn test_slice_without_a_skeleton_is_deferred() {
        let mut world = World::new();
        let rig = RigBuilder::humanoid("Human", ArchetypeId(1)).build(&mut world);
        let leg = rig.bone("LeftUpLeg").unwrap();
        let mut hackable = Hackable::default();
        hackable.add_severable(leg);
        world.insert_one(rig.root, hackable).unwrap();
        world.get::<&mut Info>(rig.skeleton_root).unwrap().name = "Armature".to_string();

        let unbuilt = UnbuiltRig {
            root: rig.root,
            archetype: rig.archetype.clone(),
        };
        let hacker = LimbHacker::default();
        let entities = world.len();
        let request = SliceRequest::new(rig.root, vec![leg]);
        assert_eq!(
            hacker.request_slice(&mut world, &unbuilt, &request).unwrap(),
            SliceOutcome::Deferred
        );
        assert_eq!(world.len(), entities);
        assert_eq!(world.get::<&Hackable>(rig.root).unwrap().severables, vec![leg]);

        // Once the skeleton root shows up the hierarchy is enough to cut against
        world.get::<&mut Info>(rig.skeleton_root).unwrap().name = "Root".to_string();
        match hacker.request_slice(&mut world, &unbuilt, &request).unwrap() {
            SliceOutcome::Sliced(report) => {
                assert_eq!(report.fragments.len(), 1);
                assert_eq!(report.states, vec![HandoffState::Finalized]);
            }
            SliceOutcome::Deferred => panic!("Slice was deferred"),
        }
    }
}
