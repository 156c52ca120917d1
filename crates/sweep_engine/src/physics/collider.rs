//! Colliders: layer filtering plus the sphere-then-box narrow phase
//!
//! A [`Collider`] belongs to exactly one entity. The entity owns it through
//! the scene graph; the collider only keeps the owner's id so a contact can
//! name who was hit.

use crate::config::ContactNormal;
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collision_layers::{CollisionLayer, CollisionLayers};
use crate::physics::volume::{compute_bounding_box, compute_bounding_sphere};
use crate::scene::scene_graph::{EntityId, SceneGraph};

/// Box shape: half extents and a local center offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    /// Half size along each axis, before world scale
    pub half_extents: Vec3,
    /// Offset of the box center from the owner's origin
    pub center: Vec3,
}

/// Collision shape types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned box
    Box(BoxShape),
}

/// Result of a positive collision test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The entity on the other side of the contact
    pub other: EntityId,
    /// Layer of the other side's collider
    pub other_layer: CollisionLayer,
    /// World-space contact point (the testing box's center)
    pub point: Vec3,
    /// Unit normal pointing away from the receiver, toward `other`
    pub normal: Vec3,
}

impl Contact {
    /// The same contact as seen from `other`
    ///
    /// `receiver` and `receiver_layer` describe the side that produced this
    /// contact; the normal is flipped so it again points away from whoever
    /// receives it.
    pub fn mirrored(&self, receiver: EntityId, receiver_layer: CollisionLayer) -> Contact {
        Contact {
            other: receiver,
            other_layer: receiver_layer,
            point: self.point,
            normal: -self.normal,
        }
    }
}

/// Collider attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    owner: Option<EntityId>,
    shape: ColliderShape,
    layer: CollisionLayer,
    mask: CollisionLayers,
    is_trigger: bool,
}

impl Collider {
    /// Create a box collider on the default layer that tests against everything
    ///
    /// # Panics
    /// If any half extent is negative or not finite.
    pub fn cuboid(half_extents: Vec3) -> Self {
        assert_valid_extents(half_extents);
        Self {
            owner: None,
            shape: ColliderShape::Box(BoxShape {
                half_extents,
                center: Vec3::zeros(),
            }),
            layer: CollisionLayer::Default,
            mask: CollisionLayers::EVERYTHING,
            is_trigger: false,
        }
    }

    /// Builder: local center offset
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.set_center(center);
        self
    }

    /// Builder: layer
    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Builder: collision mask
    pub fn with_mask(mut self, mask: impl Into<CollisionLayers>) -> Self {
        self.mask = mask.into();
        self
    }

    /// Builder: mark this as a trigger volume
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Set the layer this collider sits on
    pub fn set_layer(&mut self, layer: CollisionLayer) {
        self.layer = layer;
    }

    /// Set the layers this collider tests against
    pub fn set_collision_mask(&mut self, mask: impl Into<CollisionLayers>) {
        self.mask = mask.into();
    }

    /// Switch between blocking and trigger behavior
    pub fn set_trigger(&mut self, is_trigger: bool) {
        self.is_trigger = is_trigger;
    }

    /// Replace the box half extents
    ///
    /// # Panics
    /// If any half extent is negative or not finite.
    pub fn set_half_extents(&mut self, half_extents: Vec3) {
        assert_valid_extents(half_extents);
        match &mut self.shape {
            ColliderShape::Box(shape) => shape.half_extents = half_extents,
        }
    }

    /// Replace the local center offset
    pub fn set_center(&mut self, center: Vec3) {
        match &mut self.shape {
            ColliderShape::Box(shape) => shape.center = center,
        }
    }

    /// Owning entity, once attached
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Shape descriptor
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Layer this collider sits on
    pub fn layer(&self) -> CollisionLayer {
        self.layer
    }

    /// Layers this collider tests against
    pub fn mask(&self) -> CollisionLayers {
        self.mask
    }

    /// Whether contacts only notify instead of blocking
    pub fn is_trigger(&self) -> bool {
        self.is_trigger
    }

    pub(crate) fn attach_to(&mut self, owner: EntityId) {
        self.owner = Some(owner);
    }

    /// Whether this collider, as initiator, wants to test `other`
    ///
    /// Asymmetric on purpose: only this mask against the other's layer.
    pub fn can_interact_with(&self, other: &Collider) -> bool {
        self.mask.accepts(other.layer)
    }

    /// Test against `other` using both owners' current world transforms
    ///
    /// Always uses center-to-center normals with a `+Y` fallback;
    /// `Scene::test_collision` applies the scene's physics settings instead.
    ///
    /// # Panics
    /// If either collider has not been attached to an entity of `graph`.
    pub fn test_collision(&self, other: &Collider, graph: &SceneGraph) -> Option<Contact> {
        if !self.can_interact_with(other) {
            return None;
        }

        let pose = graph.world_transform(self.expect_owner());
        let other_pose = graph.world_transform(other.expect_owner());
        self.test_collision_at(&pose, other, &other_pose, ContactNormal::CenterToCenter, Vec3::y())
    }

    /// Test against `other` with explicit world poses for both owners
    ///
    /// Layer filtering first, then bounding spheres, then boxes. The contact
    /// point is this box's center; `fallback_normal` is used when the normal
    /// is undefined (coincident centers).
    ///
    /// # Panics
    /// If `other` has not been attached to an entity.
    pub fn test_collision_at(
        &self,
        pose: &Transform,
        other: &Collider,
        other_pose: &Transform,
        normal_mode: ContactNormal,
        fallback_normal: Vec3,
    ) -> Option<Contact> {
        if !self.can_interact_with(other) {
            return None;
        }
        self.overlap_contact(pose, other, other_pose, normal_mode, fallback_normal)
    }

    /// Geometry-only part of [`Collider::test_collision_at`]
    pub(crate) fn overlap_contact(
        &self,
        pose: &Transform,
        other: &Collider,
        other_pose: &Transform,
        normal_mode: ContactNormal,
        fallback_normal: Vec3,
    ) -> Option<Contact> {
        let sphere = compute_bounding_sphere(self, pose);
        let other_sphere = compute_bounding_sphere(other, other_pose);
        if !sphere.intersects(&other_sphere) {
            return None;
        }

        let aabb = compute_bounding_box(self, pose);
        let other_aabb = compute_bounding_box(other, other_pose);
        if !aabb.intersects(&other_aabb) {
            return None;
        }

        let point = aabb.center();
        let normal = match normal_mode {
            ContactNormal::CenterToCenter => (other_aabb.center() - point).try_normalize(f32::EPSILON),
            ContactNormal::PenetrationAxis => aabb.penetration_axis(&other_aabb),
        }
        .unwrap_or(fallback_normal);

        Some(Contact {
            other: other.expect_owner(),
            other_layer: other.layer,
            point,
            normal,
        })
    }

    fn expect_owner(&self) -> EntityId {
        match self.owner {
            Some(owner) => owner,
            None => panic!("collider tested before being attached to an entity: {self:?}"),
        }
    }
}

fn assert_valid_extents(half_extents: Vec3) {
    assert!(
        half_extents.iter().all(|e| e.is_finite() && *e >= 0.0),
        "box half extents must be finite and non-negative, got {half_extents:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    fn graph_with(colliders: &[(Vec3, Collider)]) -> (SceneGraph, Vec<EntityId>) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let ids = colliders
            .iter()
            .map(|(position, collider)| {
                let id = graph.spawn(root, Transform::from_position(*position)).unwrap();
                graph.add_collider(id, collider.clone()).unwrap();
                id
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn test_overlapping_boxes_produce_contact() {
        let unit = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let (graph, ids) = graph_with(&[(Vec3::zeros(), unit.clone()), (Vec3::new(0.8, 0.0, 0.0), unit)]);

        let a = &graph.colliders(ids[0])[0];
        let b = &graph.colliders(ids[1])[0];
        let contact = a.test_collision(b, &graph).expect("boxes overlap");

        assert_eq!(contact.other, ids[1]);
        assert_relative_eq!(contact.point, Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(contact.normal, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_separated_boxes_rejected_by_both_phases() {
        let unit = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let (graph, ids) = graph_with(&[(Vec3::zeros(), unit.clone()), (Vec3::new(3.0, 0.0, 0.0), unit)]);

        let a = &graph.colliders(ids[0])[0];
        let b = &graph.colliders(ids[1])[0];
        let pose_a = graph.world_transform(ids[0]);
        let pose_b = graph.world_transform(ids[1]);

        assert!(a.test_collision(b, &graph).is_none());
        assert!(!compute_bounding_sphere(a, &pose_a).intersects(&compute_bounding_sphere(b, &pose_b)));
    }

    #[test]
    fn test_sphere_pass_box_reject() {
        // Diagonal neighbours: spheres overlap, boxes do not
        let unit = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let (graph, ids) = graph_with(&[(Vec3::zeros(), unit.clone()), (Vec3::new(1.1, 1.1, 0.0), unit)]);

        let a = &graph.colliders(ids[0])[0];
        let b = &graph.colliders(ids[1])[0];
        let pose_a = graph.world_transform(ids[0]);
        let pose_b = graph.world_transform(ids[1]);

        assert!(compute_bounding_sphere(a, &pose_a).intersects(&compute_bounding_sphere(b, &pose_b)));
        assert!(a.test_collision(b, &graph).is_none());
    }

    #[test]
    fn test_mask_filtering_ignores_geometry() {
        let wall = Collider::cuboid(Vec3::new(1.0, 1.0, 1.0))
            .with_layer(CollisionLayer::Wall)
            .with_mask(CollisionLayer::Player);
        let bullet = Collider::cuboid(Vec3::new(1.0, 1.0, 1.0)).with_layer(CollisionLayer::Bullet);
        let (graph, ids) = graph_with(&[(Vec3::zeros(), wall), (Vec3::zeros(), bullet)]);

        let wall = &graph.colliders(ids[0])[0];
        let bullet = &graph.colliders(ids[1])[0];

        assert!(!wall.can_interact_with(bullet));
        assert!(wall.test_collision(bullet, &graph).is_none());
        // The other direction is a separate question
        assert!(bullet.can_interact_with(wall));
    }

    #[test]
    fn test_bullet_mask_skips_player_at_full_overlap() {
        let bullet = Collider::cuboid(Vec3::new(0.1, 0.1, 0.1))
            .with_layer(CollisionLayer::Bullet)
            .with_mask(CollisionLayer::Wall | CollisionLayer::Enemy);
        let player = Collider::cuboid(Vec3::new(0.5, 1.0, 0.5)).with_layer(CollisionLayer::Player);
        let (graph, ids) = graph_with(&[(Vec3::zeros(), bullet), (Vec3::zeros(), player)]);

        let bullet = &graph.colliders(ids[0])[0];
        let player = &graph.colliders(ids[1])[0];

        assert!(bullet.test_collision(player, &graph).is_none());
    }

    #[test]
    fn test_coincident_centers_use_fallback_normal() {
        let unit = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let (graph, ids) = graph_with(&[(Vec3::zeros(), unit.clone()), (Vec3::zeros(), unit)]);

        let a = &graph.colliders(ids[0])[0];
        let b = &graph.colliders(ids[1])[0];
        let contact = a.test_collision(b, &graph).expect("identical boxes overlap");

        assert_relative_eq!(contact.normal, Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_child_collider_uses_world_position() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.spawn(root, Transform::from_position(Vec3::new(10.0, 0.0, 0.0))).unwrap();
        let child = graph.spawn(parent, Transform::from_position(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let target = graph.spawn(root, Transform::from_position(Vec3::new(11.0, 0.0, 0.0))).unwrap();
        graph.add_collider(child, Collider::cuboid(Vec3::new(0.5, 0.5, 0.5))).unwrap();
        graph.add_collider(target, Collider::cuboid(Vec3::new(0.5, 0.5, 0.5))).unwrap();

        let contact = graph.colliders(target)[0].test_collision(&graph.colliders(child)[0], &graph);

        assert!(contact.is_some());
    }

    #[test]
    fn test_mirrored_contact_flips_normal() {
        let unit = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let (graph, ids) = graph_with(&[(Vec3::zeros(), unit.clone()), (Vec3::new(0.0, 0.0, 0.5), unit)]);
        let contact = graph.colliders(ids[0])[0]
            .test_collision(&graph.colliders(ids[1])[0], &graph)
            .unwrap();

        let mirrored = contact.mirrored(ids[0], CollisionLayer::Default);

        assert_eq!(mirrored.other, ids[0]);
        assert_relative_eq!(mirrored.normal, -contact.normal, epsilon = EPSILON);
        assert_relative_eq!(mirrored.point, contact.point, epsilon = EPSILON);
    }

    #[test]
    #[should_panic(expected = "before being attached")]
    fn test_unattached_collider_panics() {
        let loose = Collider::cuboid(Vec3::new(0.5, 0.5, 0.5));
        let graph = SceneGraph::new();
        let _ = loose.test_collision(&loose.clone(), &graph);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_negative_extents_panic() {
        let _ = Collider::cuboid(Vec3::new(-1.0, 1.0, 1.0));
    }
}
