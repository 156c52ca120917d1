//! Entity behaviors
//!
//! A [`Behavior`] is the per-entity script the scene calls into. Every hook
//! receives an [`EntityContext`], a mutable view of the whole scene focused
//! on the entity the hook belongs to, so hooks can move, spawn and destroy
//! freely.

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::collider::{Collider, Contact};
use crate::scene::runtime::Scene;
use crate::scene::scene_graph::{EntityId, SceneError, SceneGraph};

/// Lifecycle and collision hooks for one entity
///
/// Every hook has an empty default, so implementors override only what
/// they need.
pub trait Behavior: 'static {
    /// Called once, on the first tick the entity is reached while enabled
    fn on_init(&mut self, _ctx: &mut EntityContext<'_>) {}

    /// Called every tick while the entity is enabled and attached
    fn on_update(&mut self, _ctx: &mut EntityContext<'_>, _delta_time: f32) {}

    /// A blocking contact began; the normal points away from this entity
    fn on_collision(&mut self, _ctx: &mut EntityContext<'_>, _contact: &Contact) {}

    /// A trigger pair involving this entity started overlapping
    fn on_trigger_enter(&mut self, _ctx: &mut EntityContext<'_>, _contact: &Contact) {}

    /// A trigger pair involving this entity stopped overlapping
    fn on_trigger_exit(&mut self, _ctx: &mut EntityContext<'_>, _contact: &Contact) {}
}

/// Scene access from inside a hook
pub struct EntityContext<'a> {
    scene: &'a mut Scene,
    entity: EntityId,
}

impl<'a> EntityContext<'a> {
    pub(crate) fn new(scene: &'a mut Scene, entity: EntityId) -> Self {
        Self { scene, entity }
    }

    /// The entity this hook belongs to
    pub fn id(&self) -> EntityId {
        self.entity
    }

    /// The whole scene
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The whole scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// Shortcut to the scene graph
    pub fn graph(&self) -> &SceneGraph {
        self.scene.graph()
    }

    /// Whether the entity still exists and is reachable from the root
    pub fn is_alive(&self) -> bool {
        self.scene.graph().is_in_tree(self.entity)
    }

    /// Local position, or zero once destroyed
    pub fn position(&self) -> Vec3 {
        self.scene.graph().local_position(self.entity).unwrap_or_else(Vec3::zeros)
    }

    /// Set the local position without collision checks
    pub fn set_position(&mut self, position: Vec3) {
        // A destroyed entity has nowhere to go
        let _ = self.scene.graph_mut().set_local_position(self.entity, position);
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        let _ = self.scene.graph_mut().set_local_rotation(self.entity, rotation);
    }

    /// Parent entity, if attached
    pub fn parent(&self) -> Option<EntityId> {
        self.scene.graph().parent(self.entity)
    }

    /// World position, or zero once destroyed
    pub fn world_position(&self) -> Vec3 {
        self.scene.graph().world_position(self.entity).unwrap_or_else(Vec3::zeros)
    }

    /// Sweep toward `to` and commit wherever the sweep ends
    ///
    /// Other entities' callbacks run during the call; this entity's own
    /// collision and trigger hooks run right after the current hook
    /// returns. Returns the committed position.
    pub fn try_move(&mut self, to: Vec3) -> Vec3 {
        self.scene.move_entity(self.entity, to)
    }

    /// [`EntityContext::try_move`] by an offset
    pub fn translate(&mut self, offset: Vec3) -> Vec3 {
        let to = self.position() + offset;
        self.try_move(to)
    }

    /// Spawn a sibling with a behavior, positioned in the shared parent's space
    pub fn spawn_sibling(
        &mut self,
        transform: Transform,
        behavior: impl Behavior,
    ) -> Result<EntityId, SceneError> {
        let parent = self
            .scene
            .graph()
            .parent(self.entity)
            .ok_or(SceneError::UnknownEntity(self.entity))?;
        self.scene.spawn_with(parent, transform, behavior)
    }

    /// Spawn a child with a behavior
    pub fn spawn_child(
        &mut self,
        transform: Transform,
        behavior: impl Behavior,
    ) -> Result<EntityId, SceneError> {
        self.scene.spawn_with(self.entity, transform, behavior)
    }

    /// Attach a collider to this entity
    pub fn add_collider(&mut self, collider: Collider) -> Result<usize, SceneError> {
        self.scene.graph_mut().add_collider(self.entity, collider)
    }

    /// Destroy this entity and its subtree
    ///
    /// The running hook finishes normally; nothing of the entity is called
    /// afterwards. Destroying twice is a no-op.
    pub fn destroy(&mut self) {
        if self.scene.graph().contains(self.entity) {
            let _ = self.scene.destroy(self.entity);
        }
    }
}
