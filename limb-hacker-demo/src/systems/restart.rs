use limb_hacker::hecs::{Entity, World};

use super::spawner::Spawner;

/// A button that respawns the character. Only shown while the spawner is able to.
#[derive(Debug, Clone, Default)]
pub struct RestartButton {
    pub visible: bool,
}

impl RestartButton {
    pub fn update(&mut self, spawner: &Spawner) {
        self.visible = spawner.can_instantiate();
    }

    pub fn click(&self, world: &mut World, spawner: &mut Spawner) -> Option<Entity> {
        if !self.visible {
            return None;
        }
        spawner.instantiate(world)
    }
}
