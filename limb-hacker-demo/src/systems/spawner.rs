use limb_hacker::{
    components::{Animator, Fragment, Hackable},
    hecs::{Entity, World},
    resources::{AvatarRig, RigContext},
    rig_builder::{Rig, RigBuilder},
    systems::{slice::InfillMode, ArchetypeCheck},
    util::Hierarchy,
    LimbHacker, LimbHackerResult,
};
use log::{debug, info};

/// Name of the animation state a character idles in once it has been built
pub const STANDING: &str = "Standing";

/// A character the spawner has put into the world
#[derive(Debug)]
pub struct Character {
    pub rig: Rig,
    pub avatar: AvatarRig,
    build_frames_left: u32,
    initialised: bool,
}

/// Spawns characters, pretending to be an avatar system that takes a few frames to build each one.
#[derive(Debug)]
pub struct Spawner {
    builders: Vec<RigBuilder>,
    next_builder: usize,
    build_frames: u32,
    infill: Option<InfillMode>,
    character: Option<Character>,
}

impl Spawner {
    pub fn new(builders: Vec<RigBuilder>, build_frames: u32, infill: Option<InfillMode>) -> Self {
        Self {
            builders,
            next_builder: 0,
            build_frames,
            infill,
            character: None,
        }
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    /// A new character can only be spawned once the last one has finished building
    pub fn can_instantiate(&self) -> bool {
        self.character
            .as_ref()
            .map_or(true, |c| !c.avatar.is_dirty())
    }

    /// Throw away the current character (and everything hacked off it) and spawn the next one
    pub fn instantiate(&mut self, world: &mut World) -> Option<Entity> {
        if !self.can_instantiate() || self.builders.is_empty() {
            return None;
        }
        if let Some(old) = self.character.take() {
            despawn_character(world, old.rig.root);
        }

        let builder = &self.builders[self.next_builder % self.builders.len()];
        self.next_builder += 1;

        let rig = builder.build(world);
        let _ = world.insert_one(rig.root, Hackable::new(self.infill));
        if let Ok(mut animator) = world.get::<&mut Animator>(rig.root) {
            animator.current_state = "Spawning".to_string();
        }

        let mut avatar = AvatarRig::new(rig.root, rig.archetype.clone());
        for other in &self.builders {
            avatar.add_archetype(other.archetype());
        }
        info!(
            "[DEMO] Spawned {}, building for {} frames",
            rig.archetype.name, self.build_frames
        );

        let root = rig.root;
        self.character = Some(Character {
            rig,
            avatar,
            build_frames_left: self.build_frames,
            initialised: false,
        });
        Some(root)
    }

    /// Advance the build of the current character, then keep its hackable in step with it.
    pub fn tick(
        &mut self,
        world: &mut World,
        hacker: &LimbHacker,
    ) -> LimbHackerResult<Option<ArchetypeCheck>> {
        let Some(character) = self.character.as_mut() else {
            return Ok(None);
        };

        if character.avatar.is_dirty() {
            character.build_frames_left = character.build_frames_left.saturating_sub(1);
            if character.build_frames_left > 0 {
                debug!("[DEMO] {} frames of building left", character.build_frames_left);
                return Ok(Some(ArchetypeCheck::Deferred));
            }
            character
                .avatar
                .finish_build(world, &hacker.config().skeleton_root_name);
            if let Ok(mut animator) = world.get::<&mut Animator>(character.rig.root) {
                animator.current_state = STANDING.to_string();
            }
        }

        if !character.initialised {
            character.initialised = true;
            return hacker.init_hackable(world, &character.avatar).map(Some);
        }
        hacker.update(world, &character.avatar).map(Some)
    }
}

/// Despawn `root`, everything beneath it and every fragment that was cut from it
fn despawn_character(world: &mut World, root: Entity) {
    let fragments: Vec<Entity> = world
        .query::<&Fragment>()
        .iter()
        .filter(|(_, fragment)| fragment.source == root)
        .map(|(entity, _)| entity)
        .collect();

    let hierarchy = Hierarchy::snapshot(world);
    let doomed: Vec<Entity> = std::iter::once(root)
        .chain(fragments)
        .flat_map(|e| std::iter::once(e).chain(hierarchy.descendants(e)))
        .collect();
    for entity in doomed {
        let _ = world.despawn(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limb_hacker::archetype::ArchetypeId;

    #[test]
    pub fn test_cant_instantiate_while_building() {
        let mut world = World::new();
        let hacker = LimbHacker::default();
        let mut spawner = Spawner::new(
            vec![RigBuilder::humanoid("Human", ArchetypeId(1))],
            2,
            None,
        );
        assert!(spawner.can_instantiate());
        let first = spawner.instantiate(&mut world).unwrap();
        assert!(!spawner.can_instantiate());
        assert!(spawner.instantiate(&mut world).is_none());

        assert_eq!(
            spawner.tick(&mut world, &hacker).unwrap(),
            Some(ArchetypeCheck::Deferred)
        );
        assert_eq!(
            spawner.tick(&mut world, &hacker).unwrap(),
            Some(ArchetypeCheck::Changed)
        );
        assert!(spawner.can_instantiate());
        assert_eq!(
            world.get::<&Animator>(first).unwrap().current_state,
            STANDING
        );

        let second = spawner.instantiate(&mut world).unwrap();
        assert!(!world.contains(first));
        assert!(world.contains(second));
    }
}
