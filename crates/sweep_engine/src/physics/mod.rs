//! Physics module for collision detection and response
//!
//! Layer filtering, bounding volumes, the box narrow phase, trigger overlap
//! tracking and the fixed-step movement resolver.

pub mod collider;
pub mod collision_layers;
pub mod movement;
pub mod triggers;
pub mod volume;

pub use collider::{BoxShape, Collider, ColliderShape, Contact};
pub use collision_layers::{CollisionLayer, CollisionLayers};
pub use movement::{slide_direction, MoveOutcome, MoveStats, MovementResolver, StepReport, Sweep};
pub use triggers::{PairContact, PairKey, TriggerTracker, TriggerTransitions};
pub use volume::{compute_bounding_box, compute_bounding_sphere, Aabb, BoundingSphere};
