//! Spatial queries
//!
//! Chooses which entities a moving collider is tested against.

pub mod spatial_query;

pub use spatial_query::{from_scope, SceneScope, SiblingScope, SpatialQuery};
