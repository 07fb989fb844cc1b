use hecs::{Entity, World};
use log::{debug, info};

use crate::{
    components::{
        Animator, AvatarBuilder, Collider, Fragment, Hackable, PhysicsAvatar, PhysicsLayer,
        RigidBody, SliceHandler, UnderConstruction,
    },
    config::HackerConfig,
    util::{activate, has_name, name_of, Hierarchy},
    RAGDOLL_CHAIN,
};

/// How far a severed piece has got in handing its bones over to the physics simulation.
///
/// The piece's skeleton is switched on one hop at a time down the `Root/Global/Position/Hips` chain. If
/// a hop is missing the piece stays where it is for good: nothing past the gap is ever switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum HandoffState {
    /// Nothing is switched on
    #[default]
    Disabled,
    /// The skeleton root is on
    RootEnabled,
    /// `Global` is on
    GlobalEnabled,
    /// `Position` is on
    PositionEnabled,
    /// `Hips` is on and simulated
    HipsEnabled,
    /// Every bone the piece needs is on and simulated
    BonesActivated,
    /// Done
    Finalized,
}

/// Drives a single severed piece through [`HandoffState`].
#[derive(Debug, Clone)]
pub struct RagdollHandoff {
    fragment: Entity,
    used_bones: Vec<Entity>,
    chain: [String; 4],
    ragdoll_layer: u32,
    state: HandoffState,
    current: Option<Entity>,
}

impl RagdollHandoff {
    /// Start handing `fragment` over to physics.
    ///
    /// The ragdoll layer comes from the physics avatar of the character the piece was cut from, then
    /// the piece's own, then `config`.
    ///
    /// The piece is stripped of everything that would have it rebuild, re-animate or be sliced again,
    /// and its root stops colliding: from here on its bones carry the simulation.
    pub fn begin(
        world: &mut World,
        fragment: Entity,
        used_bones: Vec<Entity>,
        config: &HackerConfig,
    ) -> Self {
        // The source's avatar decides, since a template may already have stripped the fragment's copy
        let source = world.get::<&Fragment>(fragment).map(|f| f.source).ok();
        let ragdoll_layer = source
            .into_iter()
            .chain(std::iter::once(fragment))
            .find_map(|e| world.get::<&PhysicsAvatar>(e).map(|a| a.ragdoll_layer).ok())
            .unwrap_or(config.ragdoll_layer);

        let _ = world.remove_one::<AvatarBuilder>(fragment);
        let _ = world.remove_one::<PhysicsAvatar>(fragment);
        let _ = world.remove_one::<SliceHandler>(fragment);
        let _ = world.remove_one::<Hackable>(fragment);
        let _ = world.remove_one::<UnderConstruction>(fragment);
        if let Ok(mut animator) = world.get::<&mut Animator>(fragment) {
            animator.enabled = false;
        }
        if let Ok(mut collider) = world.get::<&mut Collider>(fragment) {
            collider.enabled = false;
        }
        if let Ok(mut rigid_body) = world.get::<&mut RigidBody>(fragment) {
            rigid_body.set_kinematic(true);
        }

        let mut chain = RAGDOLL_CHAIN.map(|s| s.to_string());
        chain[0] = config.skeleton_root_name.clone();

        Self {
            fragment,
            used_bones,
            chain,
            ragdoll_layer,
            state: HandoffState::Disabled,
            current: None,
        }
    }

    /// How far the piece has got
    pub fn state(&self) -> HandoffState {
        self.state
    }

    /// The piece's root entity
    pub fn fragment(&self) -> Entity {
        self.fragment
    }

    /// Try to move on to the next state. Returns the state the piece is in afterwards, which is unchanged
    /// if the next hop is missing or the handoff is already finished.
    pub fn step(&mut self, world: &mut World) -> HandoffState {
        let hierarchy = Hierarchy::snapshot(world);
        let next = match self.state {
            HandoffState::Disabled => self.enable_hop(world, &hierarchy, 0),
            HandoffState::RootEnabled => self.enable_hop(world, &hierarchy, 1),
            HandoffState::GlobalEnabled => self.enable_hop(world, &hierarchy, 2),
            HandoffState::PositionEnabled => self.enable_hop(world, &hierarchy, 3),
            HandoffState::HipsEnabled => {
                self.activate_bones(world, &hierarchy);
                Some(HandoffState::BonesActivated)
            }
            HandoffState::BonesActivated => {
                info!(
                    "[LIMB_HACKER] Fragment {} is now a ragdoll",
                    name_of(world, self.fragment)
                );
                Some(HandoffState::Finalized)
            }
            HandoffState::Finalized => None,
        };

        if let Some(next) = next {
            self.state = next;
            if let Ok(mut fragment) = world.get::<&mut Fragment>(self.fragment) {
                fragment.handoff = next;
            }
        }
        self.state
    }

    /// Step until the handoff finishes or can't get any further
    pub fn run(&mut self, world: &mut World) -> HandoffState {
        loop {
            let before = self.state;
            if self.step(world) == before {
                return self.state;
            }
        }
    }

    /// Switch on the `hop`th bone of the chain, found beneath the previous one.
    fn enable_hop(
        &mut self,
        world: &mut World,
        hierarchy: &Hierarchy,
        hop: usize,
    ) -> Option<HandoffState> {
        let parent = self.current.unwrap_or(self.fragment);
        let name = &self.chain[hop];
        let bone = match hierarchy.find_child(world, parent, name) {
            Some(bone) => bone,
            None => {
                debug!(
                    "[LIMB_HACKER] {} has no {name}, stopping at {:?}",
                    name_of(world, parent),
                    self.state
                );
                return None;
            }
        };

        if hop == self.chain.len() - 1 {
            simulate(world, bone);
        } else {
            activate(world, bone);
        }
        self.current = Some(bone);

        Some(match hop {
            0 => HandoffState::RootEnabled,
            1 => HandoffState::GlobalEnabled,
            2 => HandoffState::PositionEnabled,
            _ => HandoffState::HipsEnabled,
        })
    }

    fn activate_bones(&mut self, world: &mut World, hierarchy: &Hierarchy) {
        if let Some(hips) = self.current {
            for bone in hierarchy.descendants(hips) {
                simulate(world, bone);
            }
        }

        for bone in &self.used_bones {
            simulate(world, *bone);
            let Some(parent) = hierarchy.parent(*bone) else {
                continue;
            };
            if has_name(world, parent, &self.chain[3]) || has_name(world, parent, &self.chain[2])
            {
                continue;
            }
            simulate(world, parent);
        }

        let _ = world.insert_one(self.fragment, PhysicsLayer(self.ragdoll_layer));
    }
}

/// Switch `bone` on and hand its body and collider (if it has them) to the physics simulation
fn simulate(world: &mut World, bone: Entity) {
    activate(world, bone);
    if let Ok(mut rigid_body) = world.get::<&mut RigidBody>(bone) {
        rigid_body.set_kinematic(false);
    }
    if let Ok(mut collider) = world.get::<&mut Collider>(bone) {
        collider.enabled = true;
    }
}
