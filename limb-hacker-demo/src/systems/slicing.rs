use limb_hacker::{
    components::Animator,
    hecs::{Entity, World},
    LimbHacker, LimbHackerResult, SliceOutcome, SliceRequest,
};
use log::{debug, info};

use super::spawner::{Spawner, STANDING};

/// Only lets the player slice while the character is in a particular animation state
#[derive(Debug, Clone)]
pub struct TimeForSlicing {
    pub animation_state: String,
    pub always: bool,
}

impl Default for TimeForSlicing {
    fn default() -> Self {
        Self {
            animation_state: STANDING.to_string(),
            always: false,
        }
    }
}

impl TimeForSlicing {
    pub fn is_time_for_slicing(&self, world: &World, character: Option<Entity>) -> bool {
        if self.always {
            return true;
        }
        character
            .and_then(|c| world.get::<&Animator>(c).ok())
            .map(|animator| animator.current_state == self.animation_state)
            .unwrap_or(false)
    }
}

/// Try to cut `bone` off the spawner's current character. Returns the number of fragments produced.
pub fn slicing_system(
    world: &mut World,
    spawner: &Spawner,
    filter: &TimeForSlicing,
    hacker: &LimbHacker,
    bone: &str,
) -> LimbHackerResult<usize> {
    let Some(character) = spawner.character() else {
        return Ok(0);
    };
    if !filter.is_time_for_slicing(world, Some(character.rig.root)) {
        debug!("[DEMO] Not time for slicing yet");
        return Ok(0);
    }
    let Some(target) = character.rig.bone(bone) else {
        debug!("[DEMO] {} has no {bone}", character.rig.archetype.name);
        return Ok(0);
    };

    let request = SliceRequest::new(character.rig.root, vec![target]);
    match hacker.request_slice(world, &character.avatar, &request)? {
        SliceOutcome::Deferred => {
            debug!("[DEMO] Slice at {bone} deferred");
            Ok(0)
        }
        SliceOutcome::Sliced(report) => {
            info!(
                "[DEMO] Cut at {bone}: {} fragments, handoff {:?}, {} skipped",
                report.fragments.len(),
                report.states,
                report.skipped.len()
            );
            Ok(report.fragments.len())
        }
    }
}
