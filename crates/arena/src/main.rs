//! Headless arena shooter
//!
//! Usage: `arena [config.toml|config.ron]`. Without a path the built-in
//! defaults are used. Set `RUST_LOG` to change verbosity.

mod behaviors;
mod components;
mod config;
mod game;
mod input;

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info};
use sweep_engine::config::Config;
use sweep_engine::foundation::logging;

use crate::config::ArenaConfig;
use crate::input::ScriptedInput;

fn main() {
    logging::init_with_filter("info");

    let config = match std::env::args().nth(1) {
        Some(path) => match ArenaConfig::load_from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {path}");
                config
            }
            Err(e) => {
                error!("Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => ArenaConfig::default(),
    };

    info!("Starting arena (seed {}, {}s)", config.simulation.seed, config.simulation.duration);

    match game::run(&config, Rc::new(RefCell::new(ScriptedInput::default()))) {
        Ok(stats) => {
            info!(
                "Finished: score {}, {} of {} enemies defeated, {} shots, {} fireballs, hp {:.0}%{}",
                stats.score,
                stats.enemies_defeated,
                stats.enemies_spawned,
                stats.shots_fired,
                stats.fireballs_launched,
                stats.player_health.ratio() * 100.0,
                if stats.game_over { " (game over)" } else { "" },
            );
        }
        Err(e) => {
            error!("Arena error: {e}");
            std::process::exit(1);
        }
    }
}
