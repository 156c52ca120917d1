//! Arena behaviors: player, projectiles, enemies and the spawner
//!
//! Every actor is spawned through its `spawn` helper so its collider is
//! attached before the first tick reaches it.

use std::f32::consts::TAU;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sweep_engine::prelude::*;

use crate::components::{Health, SharedStats};
use crate::config::GameplayConfig;
use crate::input::SharedInput;

/// Distance in front of the shooter where projectiles appear
const MUZZLE_OFFSET: f32 = 1.5;

/// Local forward axis
fn forward_axis() -> Vec3 {
    Vec3::new(0.0, 0.0, -1.0)
}

fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_euler_angles(0.0, yaw, 0.0)
}

/// Spawn a static wall box of full size `size` centered at `center`
pub fn spawn_wall(
    scene: &mut Scene,
    parent: EntityId,
    center: Vec3,
    size: Vec3,
) -> Result<EntityId, SceneError> {
    let wall = scene.spawn(parent, Transform::from_position(center))?;
    scene.add_collider(wall, Collider::cuboid(size * 0.5).with_layer(CollisionLayer::Wall))?;
    Ok(wall)
}

/// Player-controlled shooter
pub struct Player {
    input: SharedInput,
    stats: SharedStats,
    speed: f32,
    fire_cooldown: f32,
    fire_timer: f32,
    yaw: f32,
    settings: GameplayConfig,
}

impl Player {
    /// Player body: 1 x 2 x 1
    pub fn collider() -> Collider {
        Collider::cuboid(Vec3::new(0.5, 1.0, 0.5))
            .with_layer(CollisionLayer::Player)
            .with_mask(CollisionLayer::Wall | CollisionLayer::Enemy)
    }

    /// Spawn the player at `position`
    pub fn spawn(
        scene: &mut Scene,
        parent: EntityId,
        position: Vec3,
        settings: &GameplayConfig,
        input: SharedInput,
        stats: SharedStats,
    ) -> Result<EntityId, SceneError> {
        let player = Self {
            input,
            stats,
            speed: settings.player_speed,
            fire_cooldown: settings.fire_cooldown,
            fire_timer: 0.0,
            yaw: 0.0,
            settings: settings.clone(),
        };
        let id = scene.spawn_with(parent, Transform::from_position(position), player)?;
        scene.add_collider(id, Self::collider())?;
        Ok(id)
    }

    fn fire(&mut self, ctx: &mut EntityContext<'_>) {
        let Some(parent) = ctx.parent() else {
            return;
        };
        let direction = yaw_rotation(self.yaw) * forward_axis();
        let origin = ctx.position() + direction * MUZZLE_OFFSET;
        match Bullet::spawn(ctx.scene_mut(), parent, origin, direction, &self.settings) {
            Ok(_) => self.stats.borrow_mut().shots_fired += 1,
            Err(e) => debug!("Bullet spawn failed: {e}"),
        }
    }
}

impl Behavior for Player {
    fn on_init(&mut self, ctx: &mut EntityContext<'_>) {
        info!("Player ready at {:?}", ctx.position());
    }

    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        if self.stats.borrow().game_over {
            return;
        }

        let input = self.input.borrow_mut().sample(delta_time);

        self.yaw = (self.yaw + input.turn) % TAU;
        let rotation = yaw_rotation(self.yaw);
        ctx.set_rotation(rotation);

        let wish = Vec3::new(input.strafe, 0.0, -input.forward);
        if let Some(direction) = wish.try_normalize(1e-6) {
            ctx.translate(rotation * direction * self.speed * delta_time);
        }
        if !ctx.is_alive() {
            return;
        }

        self.fire_timer = (self.fire_timer - delta_time).max(0.0);
        if input.fire && self.fire_timer <= 0.0 {
            self.fire(ctx);
            self.fire_timer = self.fire_cooldown;
        }
    }
}

/// Player projectile
pub struct Bullet {
    direction: Vec3,
    speed: f32,
    lifetime: f32,
    age: f32,
}

impl Bullet {
    /// Bullet body: 0.2 cube that hits walls and enemies
    pub fn collider() -> Collider {
        Collider::cuboid(Vec3::new(0.1, 0.1, 0.1))
            .with_layer(CollisionLayer::Bullet)
            .with_mask(CollisionLayer::Wall | CollisionLayer::Enemy)
    }

    /// Spawn a bullet at `position` heading along `direction`
    pub fn spawn(
        scene: &mut Scene,
        parent: EntityId,
        position: Vec3,
        direction: Vec3,
        settings: &GameplayConfig,
    ) -> Result<EntityId, SceneError> {
        let bullet = Self {
            direction: direction.try_normalize(1e-6).unwrap_or_else(forward_axis),
            speed: settings.bullet_speed,
            lifetime: settings.bullet_lifetime,
            age: 0.0,
        };
        let id = scene.spawn_with(parent, Transform::from_position(position), bullet)?;
        scene.add_collider(id, Self::collider())?;
        Ok(id)
    }
}

impl Behavior for Bullet {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        ctx.translate(self.direction * self.speed * delta_time);
        if !ctx.is_alive() {
            return;
        }

        self.age += delta_time;
        if self.age >= self.lifetime {
            ctx.destroy();
        }
    }

    fn on_collision(&mut self, ctx: &mut EntityContext<'_>, _contact: &Contact) {
        ctx.destroy();
    }
}

/// Enemy projectile
///
/// Fireballs share the enemy layer, so the fireball is the side that
/// reports damage to the player.
pub struct Fireball {
    direction: Vec3,
    speed: f32,
    lifetime: f32,
    age: f32,
    stats: SharedStats,
}

impl Fireball {
    /// Fireball body: 0.6 cube that hits the player, walls and bullets
    pub fn collider() -> Collider {
        Collider::cuboid(Vec3::new(0.3, 0.3, 0.3))
            .with_layer(CollisionLayer::Enemy)
            .with_mask(CollisionLayer::Player | CollisionLayer::Wall | CollisionLayer::Bullet)
    }

    /// Spawn a fireball at `position` heading along `direction`
    pub fn spawn(
        scene: &mut Scene,
        parent: EntityId,
        position: Vec3,
        direction: Vec3,
        settings: &GameplayConfig,
        stats: SharedStats,
    ) -> Result<EntityId, SceneError> {
        let fireball = Self {
            direction: direction.try_normalize(1e-6).unwrap_or_else(forward_axis),
            speed: settings.fireball_speed,
            lifetime: settings.fireball_lifetime,
            age: 0.0,
            stats,
        };
        let id = scene.spawn_with(parent, Transform::from_position(position), fireball)?;
        scene.add_collider(id, Self::collider())?;
        Ok(id)
    }
}

impl Behavior for Fireball {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        ctx.translate(self.direction * self.speed * delta_time);
        if !ctx.is_alive() {
            return;
        }

        self.age += delta_time;
        if self.age >= self.lifetime {
            ctx.destroy();
        }
    }

    fn on_collision(&mut self, ctx: &mut EntityContext<'_>, contact: &Contact) {
        if contact.other_layer == CollisionLayer::Player {
            let mut stats = self.stats.borrow_mut();
            if stats.damage_player(1) {
                info!("Player defeated, final score {}", stats.score);
            } else {
                debug!("Player hit, {} hp left", stats.player_health.current);
            }
        }
        ctx.destroy();
    }
}

/// Stationary turret that faces the player and fires when in range
pub struct Enemy {
    target: EntityId,
    health: Health,
    fire_timer: f32,
    stats: SharedStats,
    settings: GameplayConfig,
}

impl Enemy {
    /// Enemy body: 1 x 2 x 1, hit by bullets
    pub fn collider() -> Collider {
        Collider::cuboid(Vec3::new(0.5, 1.0, 0.5))
            .with_layer(CollisionLayer::Enemy)
            .with_mask(CollisionLayer::Player | CollisionLayer::Bullet)
    }

    /// Spawn an enemy at `position` that targets `target`
    pub fn spawn(
        scene: &mut Scene,
        parent: EntityId,
        position: Vec3,
        target: EntityId,
        settings: &GameplayConfig,
        stats: SharedStats,
    ) -> Result<EntityId, SceneError> {
        let enemy = Self {
            target,
            health: Health::new(settings.enemy_max_hp),
            fire_timer: 0.0,
            stats,
            settings: settings.clone(),
        };
        let id = scene.spawn_with(parent, Transform::from_position(position), enemy)?;
        scene.add_collider(id, Self::collider())?;
        Ok(id)
    }

    fn fire(&self, ctx: &mut EntityContext<'_>, direction: Vec3) {
        let Some(parent) = ctx.parent() else {
            return;
        };
        let origin = ctx.position() + direction * MUZZLE_OFFSET;
        let spawned = Fireball::spawn(
            ctx.scene_mut(),
            parent,
            origin,
            direction,
            &self.settings,
            self.stats.clone(),
        );
        match spawned {
            Ok(_) => self.stats.borrow_mut().fireballs_launched += 1,
            Err(e) => debug!("Fireball spawn failed: {e}"),
        }
    }
}

impl Behavior for Enemy {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        if self.stats.borrow().game_over {
            return;
        }
        let Some(target) = ctx.graph().local_position(self.target) else {
            return;
        };

        let to_target = target - ctx.position();
        ctx.set_rotation(yaw_rotation((-to_target.x).atan2(-to_target.z)));

        if to_target.norm() > self.settings.enemy_detection_range {
            return;
        }
        self.fire_timer += delta_time;
        if self.fire_timer >= self.settings.enemy_fire_interval {
            self.fire_timer = 0.0;
            if let Some(direction) = to_target.try_normalize(1e-6) {
                self.fire(ctx, direction);
            }
        }
    }

    fn on_collision(&mut self, ctx: &mut EntityContext<'_>, contact: &Contact) {
        if contact.other_layer != CollisionLayer::Bullet {
            return;
        }

        self.health.take_damage(1);
        if self.health.is_dead() {
            self.stats.borrow_mut().record_kill(self.settings.points_per_enemy);
            debug!("Enemy {:?} defeated", ctx.id());
            ctx.destroy();
        }
    }
}

/// Keeps up to `max_enemies` enemies on a ring around the room center
pub struct EnemySpawner {
    target: EntityId,
    rng: StdRng,
    timer: f32,
    active: Vec<EntityId>,
    stats: SharedStats,
    settings: GameplayConfig,
}

impl EnemySpawner {
    /// Create a spawner entity under `parent`
    pub fn spawn(
        scene: &mut Scene,
        parent: EntityId,
        target: EntityId,
        seed: u64,
        settings: &GameplayConfig,
        stats: SharedStats,
    ) -> Result<EntityId, SceneError> {
        let spawner = Self {
            target,
            rng: StdRng::seed_from_u64(seed),
            timer: 0.0,
            active: Vec::new(),
            stats,
            settings: settings.clone(),
        };
        scene.spawn_with(parent, Transform::identity(), spawner)
    }

    fn spawn_enemy(&mut self, ctx: &mut EntityContext<'_>) {
        let Some(parent) = ctx.parent() else {
            return;
        };
        let angle = self.rng.gen_range(0.0..TAU);
        let radius = self.settings.room_size * 0.4;
        let position = Vec3::new(angle.cos() * radius, 1.0, angle.sin() * radius);

        let spawned = Enemy::spawn(
            ctx.scene_mut(),
            parent,
            position,
            self.target,
            &self.settings,
            self.stats.clone(),
        );
        match spawned {
            Ok(enemy) => {
                self.active.push(enemy);
                self.stats.borrow_mut().enemies_spawned += 1;
                debug!("Spawned enemy {enemy:?} at {position:?}");
            }
            Err(e) => debug!("Enemy spawn failed: {e}"),
        }
    }
}

impl Behavior for EnemySpawner {
    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        if self.stats.borrow().game_over {
            return;
        }

        self.active.retain(|&enemy| ctx.graph().is_in_tree(enemy));
        if self.active.len() >= self.settings.max_enemies as usize {
            return;
        }

        self.timer += delta_time;
        if self.timer >= self.settings.spawn_interval {
            self.timer = 0.0;
            self.spawn_enemy(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::shared_stats;
    use crate::input::{ConstantInput, InputState};
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn run(scene: &mut Scene, ticks: usize) {
        for _ in 0..ticks {
            scene.tick(DT);
        }
    }

    fn idle_input() -> SharedInput {
        Rc::new(RefCell::new(ConstantInput(InputState::default())))
    }

    #[test]
    fn test_bullet_destroyed_by_wall() {
        let settings = GameplayConfig::default();
        let mut scene = Scene::default();
        let root = scene.root();
        spawn_wall(&mut scene, root, Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 4.0, 4.0)).unwrap();
        let bullet = Bullet::spawn(&mut scene, root, Vec3::zeros(), Vec3::x(), &settings).unwrap();

        run(&mut scene, 30);

        assert!(!scene.graph().contains(bullet));
    }

    #[test]
    fn test_bullet_expires() {
        let settings = GameplayConfig {
            bullet_lifetime: 0.5,
            ..GameplayConfig::default()
        };
        let mut scene = Scene::default();
        let root = scene.root();
        let bullet = Bullet::spawn(&mut scene, root, Vec3::zeros(), Vec3::x(), &settings).unwrap();

        run(&mut scene, 20);
        assert!(scene.graph().contains(bullet));

        run(&mut scene, 20);
        assert!(!scene.graph().contains(bullet));
    }

    #[test]
    fn test_enemy_dies_after_enough_hits() {
        let settings = GameplayConfig::default();
        let stats = shared_stats(settings.player_max_hp);
        let mut scene = Scene::default();
        let root = scene.root();
        let far_target = scene
            .spawn(root, Transform::from_position(Vec3::new(0.0, 1.0, -100.0)))
            .unwrap();
        let enemy = Enemy::spawn(
            &mut scene,
            root,
            Vec3::new(5.0, 1.0, 0.0),
            far_target,
            &settings,
            stats.clone(),
        )
        .unwrap();

        for shot in 0..settings.enemy_max_hp {
            assert!(scene.graph().contains(enemy), "enemy died early at shot {shot}");
            Bullet::spawn(&mut scene, root, Vec3::new(0.0, 1.0, 0.0), Vec3::x(), &settings).unwrap();
            run(&mut scene, 30);
        }

        assert!(!scene.graph().contains(enemy));
        let stats = stats.borrow();
        assert_eq!(stats.enemies_defeated, 1);
        assert_eq!(stats.score, settings.points_per_enemy);
        assert_eq!(stats.fireballs_launched, 0);
    }

    #[test]
    fn test_fireball_damages_player() {
        let settings = GameplayConfig::default();
        let stats = shared_stats(settings.player_max_hp);
        let mut scene = Scene::default();
        let root = scene.root();
        let player = Player::spawn(
            &mut scene,
            root,
            Vec3::new(0.0, 1.7, 0.0),
            &settings,
            idle_input(),
            stats.clone(),
        )
        .unwrap();
        let fireball = Fireball::spawn(
            &mut scene,
            root,
            Vec3::new(5.0, 1.7, 0.0),
            -Vec3::x(),
            &settings,
            stats.clone(),
        )
        .unwrap();

        run(&mut scene, 60);

        assert!(scene.graph().contains(player));
        assert!(!scene.graph().contains(fireball));
        assert_eq!(stats.borrow().player_health.current, settings.player_max_hp - 1);
    }

    #[test]
    fn test_enemy_fires_at_player_in_range() {
        let settings = GameplayConfig::default();
        let stats = shared_stats(settings.player_max_hp);
        let mut scene = Scene::default();
        let root = scene.root();
        let player = Player::spawn(
            &mut scene,
            root,
            Vec3::new(0.0, 1.0, 0.0),
            &settings,
            idle_input(),
            stats.clone(),
        )
        .unwrap();
        Enemy::spawn(
            &mut scene,
            root,
            Vec3::new(0.0, 1.0, -10.0),
            player,
            &settings,
            stats.clone(),
        )
        .unwrap();

        run(&mut scene, 100);

        let stats = stats.borrow();
        assert_eq!(stats.fireballs_launched, 1);
        assert_eq!(stats.player_health.current, settings.player_max_hp - 1);
    }

    #[test]
    fn test_player_fires_with_cooldown() {
        let settings = GameplayConfig::default();
        let stats = shared_stats(settings.player_max_hp);
        let input: SharedInput = Rc::new(RefCell::new(ConstantInput(InputState {
            fire: true,
            ..InputState::default()
        })));
        let mut scene = Scene::default();
        let root = scene.root();
        Player::spawn(&mut scene, root, Vec3::zeros(), &settings, input, stats.clone()).unwrap();

        run(&mut scene, 30);

        // Half a second at a 0.1 s cooldown
        let shots = stats.borrow().shots_fired;
        assert!((5..=6).contains(&shots), "fired {shots} shots");
    }

    #[test]
    fn test_player_stopped_by_wall() {
        let settings = GameplayConfig::default();
        let stats = shared_stats(settings.player_max_hp);
        let input: SharedInput = Rc::new(RefCell::new(ConstantInput(InputState {
            forward: 1.0,
            ..InputState::default()
        })));
        let mut scene = Scene::default();
        let root = scene.root();
        spawn_wall(&mut scene, root, Vec3::new(0.0, 1.0, -5.0), Vec3::new(10.0, 4.0, 1.0)).unwrap();
        let player = Player::spawn(&mut scene, root, Vec3::new(0.0, 1.0, 0.0), &settings, input, stats).unwrap();

        run(&mut scene, 120);

        let z = scene.graph().local_position(player).unwrap().z;
        assert!(z >= -4.0 - 1e-4, "player went through the wall: z = {z}");
        assert!(z < -3.5);
    }

    #[test]
    fn test_spawner_respects_cap() {
        let settings = GameplayConfig {
            max_enemies: 2,
            spawn_interval: 0.1,
            ..GameplayConfig::default()
        };
        let stats = shared_stats(settings.player_max_hp);
        let mut scene = Scene::default();
        let root = scene.root();
        let far_target = scene
            .spawn(root, Transform::from_position(Vec3::new(0.0, 1.0, -100.0)))
            .unwrap();
        EnemySpawner::spawn(&mut scene, root, far_target, 3, &settings, stats.clone()).unwrap();

        run(&mut scene, 120);

        assert_eq!(stats.borrow().enemies_spawned, 2);
    }
}
