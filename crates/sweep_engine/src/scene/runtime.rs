//! Scene runtime: the tick loop and callback dispatch
//!
//! [`Scene`] owns the entity tree, each entity's [`Behavior`] and the
//! movement resolver. One [`Scene::tick`] walks the tree depth-first,
//! parents before children. Hooks run with the behavior taken out of the
//! scene, so a hook can freely reach back into the scene, including moving
//! other entities or destroying itself.
//!
//! A notification for an entity whose hook is already on the stack is
//! queued and delivered as soon as that hook returns.

use std::collections::VecDeque;

use log::{debug, info, warn};
use slotmap::SecondaryMap;

use crate::config::{Config, ConfigError, SceneConfig};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collider::{Collider, Contact};
use crate::physics::movement::{MoveStats, MovementResolver, StepReport};
use crate::scene::behavior::{Behavior, EntityContext};
use crate::scene::scene_graph::{ColliderHandle, EntityId, SceneError, SceneGraph};
use crate::spatial::spatial_query::SpatialQuery;

#[derive(Debug, Clone, Copy)]
enum Notification {
    Collision(Contact),
    TriggerEnter(Contact),
    TriggerExit(Contact),
}

/// A tree of entities with behaviors, advanced one tick at a time
pub struct Scene {
    graph: SceneGraph,
    behaviors: SecondaryMap<EntityId, Box<dyn Behavior>>,
    resolver: MovementResolver,
    running: SecondaryMap<EntityId, ()>,
    deferred: SecondaryMap<EntityId, VecDeque<Notification>>,
    paused: bool,
    tick_count: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::build(SceneConfig::default())
    }
}

impl Scene {
    /// Create an empty scene (just the root) from validated settings
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Load settings from a `.toml` or `.ron` file and create a scene
    pub fn from_config_file(path: &str) -> Result<Self, ConfigError> {
        let config = SceneConfig::load_from_file(path)?;
        info!("Loaded scene config from {path}");
        Self::new(config)
    }

    fn build(config: SceneConfig) -> Self {
        info!(
            "Creating scene (step {}, {:?} layers, {:?} normals, {:?} scope, paused: {})",
            config.physics.max_step_length,
            config.physics.layer_policy,
            config.physics.contact_normal,
            config.physics.query_scope,
            config.start_paused,
        );
        Self {
            graph: SceneGraph::new(),
            behaviors: SecondaryMap::new(),
            resolver: MovementResolver::new(config.physics),
            running: SecondaryMap::new(),
            deferred: SecondaryMap::new(),
            paused: config.start_paused,
            tick_count: 0,
        }
    }

    /// The entity tree
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The entity tree, mutably
    ///
    /// Removing entities through the graph skips behavior and trigger
    /// cleanup; use [`Scene::destroy`] for that.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The root entity
    pub fn root(&self) -> EntityId {
        self.graph.root()
    }

    /// The movement resolver
    pub fn resolver(&self) -> &MovementResolver {
        &self.resolver
    }

    /// Swap the candidate query used by [`Scene::resolve_move`]
    pub fn set_spatial_query(&mut self, query: Box<dyn SpatialQuery>) {
        self.resolver.set_spatial_query(query);
    }

    /// Pause or resume; a paused scene ignores [`Scene::tick`]
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether ticks are being ignored
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks actually processed
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Spawn a plain entity under `parent`
    pub fn spawn(&mut self, parent: EntityId, transform: Transform) -> Result<EntityId, SceneError> {
        self.graph.spawn(parent, transform)
    }

    /// Spawn an entity with a behavior under `parent`
    ///
    /// The behavior's `on_init` runs on the first tick that reaches it.
    pub fn spawn_with(
        &mut self,
        parent: EntityId,
        transform: Transform,
        behavior: impl Behavior,
    ) -> Result<EntityId, SceneError> {
        let entity = self.graph.spawn(parent, transform)?;
        self.behaviors.insert(entity, Box::new(behavior));
        Ok(entity)
    }

    /// Attach or replace an entity's behavior
    ///
    /// Replacing the behavior of an entity whose hook is running takes
    /// effect once that hook returns.
    pub fn set_behavior(&mut self, entity: EntityId, behavior: impl Behavior) -> Result<(), SceneError> {
        if !self.graph.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        self.behaviors.insert(entity, Box::new(behavior));
        Ok(())
    }

    /// Attach a collider to `entity`
    pub fn add_collider(&mut self, entity: EntityId, collider: Collider) -> Result<usize, SceneError> {
        self.graph.add_collider(entity, collider)
    }

    /// Enable or disable an entity and, through the tree walk, its subtree
    pub fn set_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<(), SceneError> {
        self.graph.set_enabled(entity, enabled)
    }

    /// Destroy `entity` and its subtree, dropping their behaviors and
    /// trigger state. Returns the removed ids.
    pub fn destroy(&mut self, entity: EntityId) -> Result<Vec<EntityId>, SceneError> {
        let removed = self.graph.destroy(entity)?;
        for &id in &removed {
            self.behaviors.remove(id);
            self.deferred.remove(id);
            self.resolver.forget(id);
        }
        debug!("Destroyed {:?} ({} entities)", entity, removed.len());
        Ok(removed)
    }

    /// Advance every enabled, attached entity once
    pub fn tick(&mut self, delta_time: f32) {
        if self.paused {
            return;
        }
        self.tick_count += 1;
        let root = self.graph.root();
        self.update_entity(root, delta_time);
    }

    fn update_entity(&mut self, entity: EntityId, delta_time: f32) {
        if !self.graph.is_enabled(entity) {
            return;
        }

        if !self.graph.is_started(entity) {
            self.run_hook(entity, |behavior, ctx| behavior.on_init(ctx));
            self.graph.mark_started(entity);
            if !self.graph.is_in_tree(entity) {
                return;
            }
        }

        self.run_hook(entity, |behavior, ctx| behavior.on_update(ctx, delta_time));
        if !self.graph.is_in_tree(entity) {
            return;
        }

        let children = self.graph.children(entity).to_vec();
        for child in children {
            // Skip children destroyed or re-parented by an earlier sibling
            if self.graph.parent(child) == Some(entity) {
                self.update_entity(child, delta_time);
            }
        }
    }

    /// Sweep `entity` from `from` toward `to` (parent space) and return
    /// where it ends up, without committing it
    ///
    /// Collision and trigger hooks of both participants run between steps.
    /// The sweep stops early if a hook detaches or destroys the mover.
    ///
    /// # Panics
    /// If `entity` is the root or is not attached to the tree.
    pub fn resolve_move(&mut self, entity: EntityId, from: Vec3, to: Vec3) -> Vec3 {
        let mut sweep = self.resolver.begin(&self.graph, entity, from, to);
        while !sweep.is_finished() {
            if !self.graph.is_in_tree(entity) {
                debug!("{entity:?} left the tree mid-move; stopping at {:?}", sweep.position());
                break;
            }
            let report = self.resolver.step(&mut sweep, &self.graph);
            self.dispatch_step(entity, report);
        }
        self.resolver.finish(sweep)
    }

    /// Resolve a move from the entity's current local position and commit it
    ///
    /// # Panics
    /// If `entity` is the root or is not attached to the tree.
    pub fn move_entity(&mut self, entity: EntityId, to: Vec3) -> Vec3 {
        let from = self.graph.local_position(entity).unwrap_or_else(Vec3::zeros);
        let position = self.resolve_move(entity, from, to);
        // A hook may have destroyed the mover mid-sweep
        let _ = self.graph.set_local_position(entity, position);
        position
    }

    /// Test two colliders at their owners' current world transforms
    ///
    /// Uses the same contact normal mode and fallback normal as
    /// [`Scene::resolve_move`].
    pub fn test_collision(&self, a: ColliderHandle, b: ColliderHandle) -> Result<Option<Contact>, SceneError> {
        let (collider, pose) = self.collider_pose(a)?;
        let (other, other_pose) = self.collider_pose(b)?;
        let config = self.resolver.config();
        Ok(collider.test_collision_at(
            &pose,
            other,
            &other_pose,
            config.contact_normal,
            config.fallback_normal_vec(),
        ))
    }

    fn collider_pose(&self, handle: ColliderHandle) -> Result<(&Collider, Transform), SceneError> {
        let pose = self
            .graph
            .get_world_transform(handle.entity)
            .ok_or(SceneError::UnknownEntity(handle.entity))?;
        let collider = self.graph.collider(handle).ok_or(SceneError::UnknownCollider {
            entity: handle.entity,
            index: handle.index,
        })?;
        Ok((collider, pose))
    }

    /// Counters of the most recent [`Scene::resolve_move`]
    pub fn last_move_stats(&self) -> MoveStats {
        self.resolver.last_stats()
    }

    fn dispatch_step(&mut self, mover: EntityId, report: StepReport) {
        for pair in report.began {
            self.notify(mover, Notification::Collision(pair.contact));
            self.notify(pair.key.other, Notification::Collision(pair.mirrored(mover)));
        }
        for pair in report.triggers.exited {
            self.notify(mover, Notification::TriggerExit(pair.contact));
            self.notify(pair.key.other, Notification::TriggerExit(pair.mirrored(mover)));
        }
        for pair in report.triggers.entered {
            self.notify(mover, Notification::TriggerEnter(pair.contact));
            self.notify(pair.key.other, Notification::TriggerEnter(pair.mirrored(mover)));
        }
    }

    fn notify(&mut self, entity: EntityId, notification: Notification) {
        if !self.graph.contains(entity) {
            warn!("Dropping {notification:?} for destroyed entity {entity:?}");
            return;
        }
        if self.running.contains_key(entity) {
            if let Some(queue) = self.deferred.entry(entity) {
                queue.or_default().push_back(notification);
            }
            return;
        }
        self.deliver(entity, notification);
    }

    fn deliver(&mut self, entity: EntityId, notification: Notification) {
        self.run_hook(entity, move |behavior, ctx| match notification {
            Notification::Collision(contact) => behavior.on_collision(ctx, &contact),
            Notification::TriggerEnter(contact) => behavior.on_trigger_enter(ctx, &contact),
            Notification::TriggerExit(contact) => behavior.on_trigger_exit(ctx, &contact),
        });
    }

    /// Run one hook with the entity's behavior checked out of the scene
    fn run_hook<F>(&mut self, entity: EntityId, hook: F)
    where
        F: FnOnce(&mut dyn Behavior, &mut EntityContext<'_>),
    {
        let Some(mut behavior) = self.behaviors.remove(entity) else {
            return;
        };

        self.running.insert(entity, ());
        hook(behavior.as_mut(), &mut EntityContext::new(self, entity));
        self.running.remove(entity);

        // Destroyed entities lose their behavior; a replacement set by the hook wins
        if self.graph.contains(entity) && !self.behaviors.contains_key(entity) {
            self.behaviors.insert(entity, behavior);
        }

        while let Some(notification) = self.deferred.get_mut(entity).and_then(VecDeque::pop_front) {
            self.deliver(entity, notification);
        }
        self.deferred.remove(entity);
    }
}
