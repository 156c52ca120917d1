//! Scene management
//!
//! The entity tree ([`SceneGraph`]), the behaviors attached to its entities
//! ([`Behavior`]), and the runtime that ticks them and routes collision
//! callbacks ([`Scene`]).
//!
//! ## Architecture
//!
//! ```text
//! Scene::tick
//!      ↓
//! Behavior hooks (parents before children)
//!      ↓
//! MovementResolver (fixed-step sweep)
//!      ↓
//! Collision / trigger hooks on both participants
//! ```

pub mod behavior;
pub mod runtime;
pub mod scene_graph;

#[cfg(test)]
mod tests;

pub use behavior::{Behavior, EntityContext};
pub use runtime::Scene;
pub use scene_graph::{ColliderHandle, EntityId, SceneError, SceneGraph};
