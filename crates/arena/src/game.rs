//! Arena setup and the headless run loop

use std::error::Error;

use log::{debug, info};
use sweep_engine::prelude::*;

use crate::behaviors::{spawn_wall, EnemySpawner, Player};
use crate::components::{shared_stats, ArenaStats, SharedStats};
use crate::config::{ArenaConfig, GameplayConfig};
use crate::input::SharedInput;

/// A built arena ready to tick
pub struct Arena {
    /// The scene holding every actor
    pub scene: Scene,

    /// The player entity
    pub player: EntityId,

    /// The enemy spawner entity
    pub spawner: EntityId,

    /// Score and player status
    pub stats: SharedStats,

    walls: Vec<EntityId>,
    input: SharedInput,
    config: ArenaConfig,
}

/// Floor, ceiling and four walls around the origin
fn build_room(scene: &mut Scene, settings: &GameplayConfig) -> Result<Vec<EntityId>, SceneError> {
    let root = scene.root();
    let size = settings.room_size;
    let half = size * 0.5;
    let thickness = settings.wall_thickness;
    let height = settings.wall_height;

    let pieces = [
        // Floor and ceiling
        (Vec3::new(0.0, 0.0, 0.0), Vec3::new(size, thickness, size)),
        (Vec3::new(0.0, height, 0.0), Vec3::new(size, thickness, size)),
        // Left and right
        (Vec3::new(-half, height * 0.5, 0.0), Vec3::new(thickness, height, size)),
        (Vec3::new(half, height * 0.5, 0.0), Vec3::new(thickness, height, size)),
        // Back and front
        (Vec3::new(0.0, height * 0.5, -half), Vec3::new(size, height, thickness)),
        (Vec3::new(0.0, height * 0.5, half), Vec3::new(size, height, thickness)),
    ];

    pieces
        .into_iter()
        .map(|(center, extent)| spawn_wall(scene, root, center, extent))
        .collect()
}

/// Player at eye height in the room center, and the enemy spawner
fn spawn_actors(
    scene: &mut Scene,
    config: &ArenaConfig,
    input: SharedInput,
    stats: SharedStats,
) -> Result<(EntityId, EntityId), SceneError> {
    let root = scene.root();
    let settings = &config.gameplay;
    let player = Player::spawn(
        scene,
        root,
        Vec3::new(0.0, settings.eye_height, 0.0),
        settings,
        input,
        stats.clone(),
    )?;
    let spawner = EnemySpawner::spawn(scene, root, player, config.simulation.seed, settings, stats)?;
    Ok((player, spawner))
}

impl Arena {
    /// Build the room, the player and the spawner
    pub fn build(config: &ArenaConfig, input: SharedInput) -> Result<Self, Box<dyn Error>> {
        config.validate()?;

        let mut scene = Scene::new(config.scene.clone())?;
        let settings = &config.gameplay;
        let stats = shared_stats(settings.player_max_hp);

        let walls = build_room(&mut scene, settings)?;
        info!("Built room ({} pieces, size {})", walls.len(), settings.room_size);

        let (player, spawner) = spawn_actors(&mut scene, config, input.clone(), stats.clone())?;

        Ok(Self {
            scene,
            player,
            spawner,
            stats,
            walls,
            input,
            config: config.clone(),
        })
    }

    /// Start over in the same room
    ///
    /// Every actor is destroyed, the stats are cleared and a fresh player
    /// and spawner are placed as in [`Arena::build`].
    pub fn reset(&mut self) -> Result<(), SceneError> {
        let root = self.scene.root();
        let actors: Vec<EntityId> = self
            .scene
            .graph()
            .children(root)
            .iter()
            .copied()
            .filter(|id| !self.walls.contains(id))
            .collect();
        for actor in actors {
            // An earlier destroy may have taken it already
            if self.scene.graph().contains(actor) {
                self.scene.destroy(actor)?;
            }
        }

        self.stats.borrow_mut().reset();
        let (player, spawner) = spawn_actors(
            &mut self.scene,
            &self.config,
            self.input.clone(),
            self.stats.clone(),
        )?;
        self.player = player;
        self.spawner = spawner;
        info!("Arena reset; player {player:?} back at the start");
        Ok(())
    }

    /// Snapshot of the current stats
    pub fn stats(&self) -> ArenaStats {
        self.stats.borrow().clone()
    }
}

/// Run a full headless session and return the final stats
///
/// Ticks at the configured fixed timestep until the duration elapses or
/// the player is defeated with no restarts left. After a restart the
/// returned stats cover only the latest round.
pub fn run(config: &ArenaConfig, input: SharedInput) -> Result<ArenaStats, Box<dyn Error>> {
    let mut arena = Arena::build(config, input)?;
    if arena.scene.is_paused() {
        info!("Scene configured to start paused; resuming for the headless run");
        arena.scene.set_paused(false);
    }

    let timestep = config.simulation.timestep;
    let frames = (config.simulation.duration / timestep).ceil() as u64;
    let report_every = ((config.simulation.report_interval / timestep).round() as u64).max(1);
    let mut restarts_left = config.simulation.restarts;
    info!("Running {frames} frames at {timestep:.4}s");

    for frame in 1..=frames {
        arena.scene.tick(timestep);

        if frame % report_every == 0 {
            let stats = arena.stats();
            info!(
                "t={:.1}s score={} hp={}/{} enemies={} shots={} entities={}",
                frame as f32 * timestep,
                stats.score,
                stats.player_health.current,
                stats.player_health.max,
                stats.enemies_spawned - stats.enemies_defeated,
                stats.shots_fired,
                arena.scene.graph().len(),
            );
        }

        if arena.stats.borrow().game_over {
            if restarts_left == 0 {
                info!("Game over after {frame} frames");
                break;
            }
            restarts_left -= 1;
            info!("Game over after {frame} frames; restarting ({restarts_left} restarts left)");
            arena.reset()?;
        }
    }

    debug!(
        "Spawner {:?} done; {} entities left after {} ticks",
        arena.spawner,
        arena.scene.graph().len(),
        arena.scene.tick_count()
    );
    Ok(arena.stats())
}
