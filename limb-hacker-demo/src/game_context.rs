use std::fmt::Debug;

use limb_hacker::{
    archetype::ArchetypeId, config::HackerConfig, glam::Vec3, rig_builder::RigBuilder,
    systems::slice::InfillMode, LimbHacker,
};

use crate::systems::{RestartButton, Spawner, TimeForSlicing};

/// Frames the pretend avatar system spends building a character
const BUILD_FRAMES: u32 = 3;

pub struct GameContext {
    pub state: GameState,
    pub hacker: LimbHacker,
    pub spawner: Spawner,
    pub restart_button: RestartButton,
    pub slicing_filter: TimeForSlicing,
    pub characters_left: usize,
    pub fragments_hacked: usize,
}

impl Debug for GameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameContext")
            .field("state", &self.state)
            .field("characters_left", &self.characters_left)
            .field("fragments_hacked", &self.fragments_hacked)
            .finish()
    }
}

impl GameContext {
    pub fn new(config: HackerConfig, characters: usize) -> Self {
        let human = RigBuilder::humanoid("Human", ArchetypeId(1));
        let mut elf = RigBuilder::humanoid("Elf", ArchetypeId(2));
        elf.ring_radius(0.05)
            .bone("LeftEar", "Head", Vec3::new(0.08, 0.05, 0.))
            .bone("RightEar", "Head", Vec3::new(-0.08, 0.05, 0.));

        Self {
            state: GameState::Init,
            hacker: LimbHacker::new(config),
            spawner: Spawner::new(vec![human, elf], BUILD_FRAMES, Some(InfillMode::Meticulous)),
            restart_button: Default::default(),
            slicing_filter: Default::default(),
            characters_left: characters,
            fragments_hacked: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Init,
    Building,
    Hacking { cuts: usize },
    Restarting,
    Done,
}
