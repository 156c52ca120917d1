//! Entity hierarchy
//!
//! The scene graph is a tree of entities rooted at a single root entity.
//! Each entity carries a local transform relative to its parent, an ordered
//! list of colliders, and the enabled/started flags the update loop reads.
//! Storage is a slot map, so ids of destroyed entities never alias new ones.

use slotmap::SlotMap;
use thiserror::Error;

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::collider::Collider;

slotmap::new_key_type! {
    /// Stable handle to an entity in a [`SceneGraph`]
    pub struct EntityId;
}

/// Reference to one collider of one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle {
    /// Owning entity
    pub entity: EntityId,
    /// Index in the entity's collider list
    pub index: usize,
}

impl ColliderHandle {
    /// Create a handle
    pub fn new(entity: EntityId, index: usize) -> Self {
        Self { entity, index }
    }
}

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The entity was never spawned or has been destroyed
    #[error("Unknown entity: {0:?}")]
    UnknownEntity(EntityId),

    /// The root cannot be re-parented, detached or destroyed
    #[error("The root entity cannot be {0}")]
    RootImmutable(&'static str),

    /// Re-parenting would put an entity under its own subtree
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Entity being moved
        child: EntityId,
        /// Requested parent
        parent: EntityId,
    },

    /// No collider at the given index
    #[error("Entity {entity:?} has no collider at index {index}")]
    UnknownCollider {
        /// Owning entity
        entity: EntityId,
        /// Requested index
        index: usize,
    },
}

#[derive(Debug)]
struct Node {
    transform: Transform,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    colliders: Vec<Collider>,
    enabled: bool,
    started: bool,
}

impl Node {
    fn new(transform: Transform, parent: Option<EntityId>) -> Self {
        Self {
            transform,
            parent,
            children: Vec::new(),
            colliders: Vec::new(),
            enabled: true,
            started: false,
        }
    }
}

/// Tree of entities with local transforms and colliders
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<EntityId, Node>,
    root: EntityId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root entity
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(Transform::identity(), None));
        Self { nodes, root }
    }

    /// The root entity
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Number of live entities, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists for the graph's lifetime
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the entity exists (attached or not)
    pub fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(entity)
    }

    /// Whether the entity is reachable from the root
    pub fn is_in_tree(&self, entity: EntityId) -> bool {
        let mut current = entity;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current).and_then(|node| node.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Create an entity under `parent`, appended after its existing children
    pub fn spawn(&mut self, parent: EntityId, transform: Transform) -> Result<EntityId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownEntity(parent));
        }
        let id = self.nodes.insert(Node::new(transform, Some(parent)));
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Move `child` (and its subtree) under `parent`
    pub fn attach(&mut self, child: EntityId, parent: EntityId) -> Result<(), SceneError> {
        if child == self.root {
            return Err(SceneError::RootImmutable("re-parented"));
        }
        for id in [child, parent] {
            if !self.contains(id) {
                return Err(SceneError::UnknownEntity(id));
            }
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { child, parent });
        }

        self.unlink(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Remove `entity` from its parent, keeping the subtree alive
    ///
    /// A detached subtree is skipped by the update loop and by collision
    /// queries until it is attached again.
    pub fn detach(&mut self, entity: EntityId) -> Result<(), SceneError> {
        if entity == self.root {
            return Err(SceneError::RootImmutable("detached"));
        }
        if !self.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        self.unlink(entity);
        Ok(())
    }

    /// Remove `entity` and its whole subtree
    ///
    /// Returns the removed ids, `entity` first, in pre-order.
    pub fn destroy(&mut self, entity: EntityId) -> Result<Vec<EntityId>, SceneError> {
        if entity == self.root {
            return Err(SceneError::RootImmutable("destroyed"));
        }
        if !self.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }

        self.unlink(entity);
        let removed = self.subtree(entity);
        for id in &removed {
            self.nodes.remove(*id);
        }
        Ok(removed)
    }

    /// Parent of `entity`, if attached
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(entity).and_then(|node| node.parent)
    }

    /// Children of `entity` in attachment order
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.nodes
            .get(entity)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// `entity` followed by all its descendants, pre-order
    pub fn subtree(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        if !self.contains(entity) {
            return out;
        }
        let mut stack = vec![entity];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `entity` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Local transform relative to the parent
    pub fn local_transform(&self, entity: EntityId) -> Option<&Transform> {
        self.nodes.get(entity).map(|node| &node.transform)
    }

    /// Replace the local transform
    pub fn set_local_transform(&mut self, entity: EntityId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(entity)?.transform = transform;
        Ok(())
    }

    /// Local position relative to the parent
    pub fn local_position(&self, entity: EntityId) -> Option<Vec3> {
        self.local_transform(entity).map(|t| t.position)
    }

    /// Set the local position
    pub fn set_local_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(entity)?.transform.position = position;
        Ok(())
    }

    /// Set the local rotation
    pub fn set_local_rotation(&mut self, entity: EntityId, rotation: Quat) -> Result<(), SceneError> {
        self.node_mut(entity)?.transform.rotation = rotation;
        Ok(())
    }

    /// Set the local scale
    pub fn set_local_scale(&mut self, entity: EntityId, scale: Vec3) -> Result<(), SceneError> {
        self.node_mut(entity)?.transform.scale = scale;
        Ok(())
    }

    /// World transform: the parent's world transform composed with the local one
    pub fn get_world_transform(&self, entity: EntityId) -> Option<Transform> {
        let local = *self.local_transform(entity)?;
        Some(self.parent_world_transform(entity).combine(&local))
    }

    /// World transform of an entity known to exist
    ///
    /// # Panics
    /// If `entity` is not in the graph.
    pub fn world_transform(&self, entity: EntityId) -> Transform {
        match self.get_world_transform(entity) {
            Some(transform) => transform,
            None => panic!("world transform requested for unknown entity {entity:?}"),
        }
    }

    /// World transform of the parent, identity for the root and detached entities
    pub fn parent_world_transform(&self, entity: EntityId) -> Transform {
        let mut chain = Vec::new();
        let mut current = self.parent(entity);
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
            .iter()
            .rev()
            .filter_map(|id| self.local_transform(*id))
            .fold(Transform::identity(), |world, local| world.combine(local))
    }

    /// World position
    pub fn world_position(&self, entity: EntityId) -> Option<Vec3> {
        self.get_world_transform(entity).map(|t| t.position)
    }

    /// Attach a collider; returns its index in the entity's list
    pub fn add_collider(&mut self, entity: EntityId, mut collider: Collider) -> Result<usize, SceneError> {
        let node = self.node_mut(entity)?;
        collider.attach_to(entity);
        node.colliders.push(collider);
        Ok(node.colliders.len() - 1)
    }

    /// Remove and return a collider; later indices shift down
    pub fn remove_collider(&mut self, entity: EntityId, index: usize) -> Result<Collider, SceneError> {
        let node = self.node_mut(entity)?;
        if index >= node.colliders.len() {
            return Err(SceneError::UnknownCollider { entity, index });
        }
        Ok(node.colliders.remove(index))
    }

    /// Colliders of `entity` in insertion order, empty if unknown
    pub fn colliders(&self, entity: EntityId) -> &[Collider] {
        self.nodes
            .get(entity)
            .map_or(&[][..], |node| node.colliders.as_slice())
    }

    /// Collider by handle
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders(handle.entity).get(handle.index)
    }

    /// Mutable collider access for layer, mask or trigger changes
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.nodes
            .get_mut(handle.entity)
            .and_then(|node| node.colliders.get_mut(handle.index))
    }

    /// Enable or disable `entity` and, structurally, its subtree
    pub fn set_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<(), SceneError> {
        self.node_mut(entity)?.enabled = enabled;
        Ok(())
    }

    /// Own enabled flag; false for unknown entities
    pub fn is_enabled(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.enabled)
    }

    /// Whether the update loop has initialized `entity`
    pub fn is_started(&self, entity: EntityId) -> bool {
        self.nodes.get(entity).is_some_and(|node| node.started)
    }

    pub(crate) fn mark_started(&mut self, entity: EntityId) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.started = true;
        }
    }

    /// All live entity ids in storage order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.keys()
    }

    fn node_mut(&mut self, entity: EntityId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(entity).ok_or(SceneError::UnknownEntity(entity))
    }

    fn unlink(&mut self, entity: EntityId) {
        if let Some(parent) = self.nodes.get_mut(entity).and_then(|node| node.parent.take()) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&child| child != entity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_spawn_appends_children_in_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let b = graph.spawn(root, Transform::identity()).unwrap();

        assert_eq!(graph.children(root), &[a, b]);
        assert_eq!(graph.parent(a), Some(root));
        assert!(graph.is_in_tree(b));
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph
            .spawn(root, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)).with_uniform_scale(2.0))
            .unwrap();
        let child = graph.spawn(parent, Transform::from_position(Vec3::new(1.0, 2.0, 0.0))).unwrap();

        let world = graph.world_transform(child);

        assert_relative_eq!(world.position, Vec3::new(12.0, 4.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(world.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_world_transform_tracks_parent_motion() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.spawn(root, Transform::identity()).unwrap();
        let child = graph.spawn(parent, Transform::from_position(Vec3::new(0.0, 1.0, 0.0))).unwrap();

        graph.set_local_position(parent, Vec3::new(5.0, 0.0, 0.0)).unwrap();

        assert_relative_eq!(graph.world_position(child).unwrap(), Vec3::new(5.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_detach_removes_from_tree_but_keeps_entity() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let b = graph.spawn(a, Transform::identity()).unwrap();

        graph.detach(a).unwrap();

        assert!(graph.contains(a));
        assert!(!graph.is_in_tree(a));
        assert!(!graph.is_in_tree(b));
        assert!(graph.children(root).is_empty());

        graph.attach(a, root).unwrap();
        assert!(graph.is_in_tree(b));
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let b = graph.spawn(a, Transform::identity()).unwrap();
        let c = graph.spawn(b, Transform::identity()).unwrap();
        let keep = graph.spawn(root, Transform::identity()).unwrap();

        let removed = graph.destroy(a).unwrap();

        assert_eq!(removed, vec![a, b, c]);
        assert!(!graph.contains(c));
        assert_eq!(graph.children(root), &[keep]);
        assert_eq!(graph.destroy(a), Err(SceneError::UnknownEntity(a)));
    }

    #[test]
    fn test_root_is_immutable() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        assert!(matches!(graph.destroy(root), Err(SceneError::RootImmutable(_))));
        assert!(matches!(graph.detach(root), Err(SceneError::RootImmutable(_))));
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let b = graph.spawn(a, Transform::identity()).unwrap();

        assert_eq!(graph.attach(a, b), Err(SceneError::Cycle { child: a, parent: b }));
        assert_eq!(graph.attach(a, a), Err(SceneError::Cycle { child: a, parent: a }));
    }

    #[test]
    fn test_add_collider_sets_owner() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();

        let index = graph.add_collider(a, Collider::cuboid(Vec3::new(1.0, 1.0, 1.0))).unwrap();

        assert_eq!(index, 0);
        assert_eq!(graph.colliders(a)[0].owner(), Some(a));
        assert!(matches!(
            graph.remove_collider(a, 3),
            Err(SceneError::UnknownCollider { index: 3, .. })
        ));
    }

    #[test]
    fn test_subtree_is_preorder() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let a1 = graph.spawn(a, Transform::identity()).unwrap();
        let b = graph.spawn(root, Transform::identity()).unwrap();

        assert_eq!(graph.subtree(root), vec![root, a, a1, b]);
    }
}
