mod game_context;
mod systems;

use anyhow::Context;
use game_context::{GameContext, GameState};
use limb_hacker::{config::HackerConfig, hecs::World};
use log::info;
use systems::game::game_system;

/// Give up if the game hasn't finished by now
const MAX_FRAMES: usize = 1_000;

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("[DEMO] MAIN!");
    real_main().expect("[DEMO] ERROR IN MAIN!");
}

pub fn real_main() -> anyhow::Result<()> {
    let config = match std::env::var("LIMB_HACKER_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Unable to read config from {path}"))?;
            serde_json::from_str(&json).context("Invalid config")?
        }
        Err(_) => HackerConfig::default(),
    };

    let mut world = World::new();
    let mut game_context = GameContext::new(config, 2);

    for frame in 0..MAX_FRAMES {
        tick(&mut world, &mut game_context)
            .with_context(|| format!("Frame {frame} of {game_context:?}"))?;
        if game_context.state == GameState::Done {
            return Ok(());
        }
    }

    anyhow::bail!("Gave up after {MAX_FRAMES} frames: {game_context:?}")
}

fn tick(world: &mut World, game_context: &mut GameContext) -> anyhow::Result<()> {
    game_system(world, game_context)?;
    Ok(())
}
