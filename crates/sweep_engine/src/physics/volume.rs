//! Bounding volumes derived from a collider and its owner's world transform
//!
//! Volumes are never cached: every call reads the pose it is given, so a
//! child of a moving parent always reports where it actually is this frame.

use crate::foundation::math::{Transform, Vec3};
use crate::physics::collider::{Collider, ColliderShape};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half size of the AABB
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Overlap depth along each axis (negative on a separated axis)
    pub fn overlap(&self, other: &Aabb) -> Vec3 {
        self.max.inf(&other.max) - self.min.sup(&other.min)
    }

    /// Unit axis of least overlap, pointing from this box toward `other`
    ///
    /// Returns `None` when the centers coincide on that axis, since the sign
    /// is then undefined.
    pub fn penetration_axis(&self, other: &Aabb) -> Option<Vec3> {
        let overlap = self.overlap(other);
        let offset = other.center() - self.center();

        let axis = (0..3)
            .min_by(|&a, &b| overlap[a].total_cmp(&overlap[b]))
            .unwrap_or(0);
        if offset[axis] == 0.0 {
            return None;
        }

        let mut normal = Vec3::zeros();
        normal[axis] = offset[axis].signum();
        Some(normal)
    }

    /// Smallest sphere enclosing this box
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center(), self.half_extents().norm())
    }
}

/// A bounding sphere for the broad-phase test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another (touching counts)
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}

/// World-space box of `collider` when its owner sits at `pose`
///
/// The half extents are scaled by the world scale and the box is centered
/// at the world position plus the collider's local center offset.
pub fn compute_bounding_box(collider: &Collider, pose: &Transform) -> Aabb {
    match collider.shape() {
        ColliderShape::Box(shape) => {
            let half = shape.half_extents.component_mul(&pose.scale).abs();
            Aabb::from_center_half_extents(pose.position + shape.center, half)
        }
    }
}

/// World-space sphere of `collider` when its owner sits at `pose`
///
/// Always derived from [`compute_bounding_box`] so the two test levels can
/// never disagree about a pair.
pub fn compute_bounding_sphere(collider: &Collider, pose: &Transform) -> BoundingSphere {
    compute_bounding_box(collider, pose).bounding_sphere()
}
