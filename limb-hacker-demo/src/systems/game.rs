use limb_hacker::{
    bone::BoneIdentity, components::Hackable, hecs::World, resources::RigContext,
    LimbHackerResult,
};
use log::{info, warn};

use crate::{
    game_context::{GameContext, GameState},
    systems::slicing_system,
};

/// The limbs the player goes for, in order
pub const CUT_ORDER: [&str; 4] = ["LeftForeArm", "RightLeg", "LeftEar", "Head"];

pub fn game_system(world: &mut World, game_context: &mut GameContext) -> LimbHackerResult<()> {
    game_context.spawner.tick(world, &game_context.hacker)?;
    game_context.restart_button.update(&game_context.spawner);

    // Get next state
    if let Some(next_state) = run(world, game_context)? {
        // If state has changed, transition
        transition(world, game_context, next_state)?;
    }
    Ok(())
}

fn transition(
    world: &mut World,
    game_context: &mut GameContext,
    next_state: GameState,
) -> LimbHackerResult<()> {
    match (game_context.state, next_state) {
        (GameState::Init | GameState::Restarting, GameState::Building) => {
            game_context.characters_left -= 1;
        }
        (GameState::Building, GameState::Hacking { .. }) => select_targets(world, game_context)?,
        (_, GameState::Done) => {
            info!(
                "[DEMO] All done: {} fragments hacked, {} entities left",
                game_context.fragments_hacked,
                world.len()
            );
        }
        _ => {}
    }

    game_context.state = next_state;
    Ok(())
}

fn run(world: &mut World, game_context: &mut GameContext) -> LimbHackerResult<Option<GameState>> {
    match game_context.state {
        GameState::Init | GameState::Restarting => {
            if game_context.characters_left == 0 {
                return Ok(Some(GameState::Done));
            }
            let spawned = game_context
                .restart_button
                .click(world, &mut game_context.spawner);
            Ok(spawned.map(|_| GameState::Building))
        }
        GameState::Building => {
            let built = game_context.spawner.can_instantiate();
            Ok(built.then_some(GameState::Hacking { cuts: 0 }))
        }
        GameState::Hacking { cuts } => {
            let Some(bone) = CUT_ORDER.get(cuts) else {
                return Ok(Some(GameState::Restarting));
            };
            game_context.fragments_hacked += slicing_system(
                world,
                &game_context.spawner,
                &game_context.slicing_filter,
                &game_context.hacker,
                bone,
            )?;
            Ok(Some(GameState::Hacking { cuts: cuts + 1 }))
        }
        GameState::Done => Ok(None),
    }
}

/// Mark the limbs in [`CUT_ORDER`] as severable on the freshly built character
fn select_targets(world: &mut World, game_context: &GameContext) -> LimbHackerResult<()> {
    let Some(character) = game_context.spawner.character() else {
        return Ok(());
    };
    if let Ok(mut hackable) = world.get::<&mut Hackable>(character.rig.root) {
        for name in CUT_ORDER {
            if !hackable.selector.select(BoneIdentity::new(name)) {
                warn!(
                    "[DEMO] {} can't be severed at {name}",
                    character.avatar.active_archetype().name
                );
            }
        }
    }
    game_context
        .hacker
        .sync_severables(world, &character.avatar)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use limb_hacker::{components::Fragment, config::HackerConfig};

    #[test]
    pub fn test_two_characters_get_hacked() {
        let mut world = World::new();
        let mut game_context = GameContext::new(HackerConfig::default(), 2);

        for _ in 0..100 {
            game_system(&mut world, &mut game_context).unwrap();
            if game_context.state == GameState::Done {
                break;
            }
        }

        assert_eq!(game_context.state, GameState::Done);
        assert_eq!(game_context.characters_left, 0);
        // The human has no ears: 3 cuts, then the elf: 4
        assert_eq!(game_context.fragments_hacked, 7);

        // The human and its fragments were cleaned up when the elf was spawned
        let sources: Vec<_> = world
            .query::<&Fragment>()
            .iter()
            .map(|(_, f)| f.source)
            .collect();
        assert_eq!(sources.len(), 4);
        let elf = game_context.spawner.character().unwrap().rig.root;
        assert!(sources.iter().all(|s| *s == elf));
    }
}
