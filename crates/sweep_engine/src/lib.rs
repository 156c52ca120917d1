//! # Sweep Engine
//!
//! A small scene runtime built around swept collision and sliding movement.
//!
//! ## Features
//!
//! - **Scene Graph**: Entity tree with local transforms and world composition
//! - **Behaviors**: Init, update, collision and trigger hooks per entity
//! - **Layered Colliders**: Bitmask layers with sphere and box tests
//! - **Swept Movement**: Fixed-step sweeps that slide along what they hit
//! - **Triggers**: Enter/exit tracking for pass-through volumes
//!
//! ## Quick Start
//!
//! ```rust
//! use sweep_engine::prelude::*;
//!
//! struct Walker;
//!
//! impl Behavior for Walker {
//!     fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
//!         ctx.translate(Vec3::new(2.0, 0.0, 0.0) * delta_time);
//!     }
//! }
//!
//! let mut scene = Scene::default();
//! let root = scene.root();
//! let walker = scene.spawn_with(root, Transform::identity(), Walker).unwrap();
//! scene.add_collider(walker, Collider::cuboid(Vec3::new(0.5, 0.5, 0.5))).unwrap();
//!
//! let wall = scene.spawn(root, Transform::from_position(Vec3::new(3.0, 0.0, 0.0))).unwrap();
//! scene
//!     .add_collider(wall, Collider::cuboid(Vec3::new(0.5, 2.0, 2.0)).with_layer(CollisionLayer::Wall))
//!     .unwrap();
//!
//! for _ in 0..120 {
//!     scene.tick(1.0 / 60.0);
//! }
//!
//! let x = scene.graph().local_position(walker).unwrap().x;
//! assert!(x <= 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ContactNormal, LayerPolicy, PhysicsConfig, QueryScope, SceneConfig},
        foundation::math::{Quat, Transform, Vec3},
        physics::{Collider, CollisionLayer, CollisionLayers, Contact, MoveStats},
        scene::{Behavior, ColliderHandle, EntityContext, EntityId, Scene, SceneError, SceneGraph},
    };
}
