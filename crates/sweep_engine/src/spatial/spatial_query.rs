//! Candidate selection for the movement resolver
//!
//! A [`SpatialQuery`] answers one question: which entities should a mover be
//! tested against right now. Answers are always derived from the current
//! tree, never from a registry, so destroyed or detached entities drop out
//! on the very next query.

use crate::config::QueryScope;
use crate::scene::scene_graph::{EntityId, SceneGraph};

/// Abstract interface for the set of colliders a mover is swept against
pub trait SpatialQuery: Send + Sync {
    /// Entities to test `mover` against, in a stable order, mover excluded
    fn candidates(&self, graph: &SceneGraph, mover: EntityId) -> Vec<EntityId>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Entities sharing the mover's parent, in attachment order
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingScope;

impl SpatialQuery for SiblingScope {
    fn candidates(&self, graph: &SceneGraph, mover: EntityId) -> Vec<EntityId> {
        let Some(parent) = graph.parent(mover) else {
            return Vec::new();
        };
        graph
            .children(parent)
            .iter()
            .copied()
            .filter(|&id| id != mover)
            .collect()
    }

    fn name(&self) -> &'static str {
        "siblings"
    }
}

/// Every attached entity outside the mover's own subtree, in pre-order
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneScope;

impl SpatialQuery for SceneScope {
    fn candidates(&self, graph: &SceneGraph, mover: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![graph.root()];
        while let Some(id) = stack.pop() {
            if id == mover {
                continue;
            }
            out.push(id);
            stack.extend(graph.children(id).iter().rev().copied());
        }
        out
    }

    fn name(&self) -> &'static str {
        "scene"
    }
}

/// Build the query matching a configured scope
pub fn from_scope(scope: QueryScope) -> Box<dyn SpatialQuery> {
    match scope {
        QueryScope::Siblings => Box::new(SiblingScope),
        QueryScope::Scene => Box::new(SceneScope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;

    fn sample() -> (SceneGraph, [EntityId; 4]) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Transform::identity()).unwrap();
        let mover = graph.spawn(root, Transform::identity()).unwrap();
        let carried = graph.spawn(mover, Transform::identity()).unwrap();
        let nested = graph.spawn(a, Transform::identity()).unwrap();
        (graph, [a, mover, carried, nested])
    }

    #[test]
    fn test_sibling_scope_excludes_mover_and_other_levels() {
        let (graph, [a, mover, _, _]) = sample();

        assert_eq!(SiblingScope.candidates(&graph, mover), vec![a]);
    }

    #[test]
    fn test_scene_scope_skips_mover_subtree() {
        let (graph, [a, mover, carried, nested]) = sample();

        let candidates = SceneScope.candidates(&graph, mover);

        assert_eq!(candidates, vec![graph.root(), a, nested]);
        assert!(!candidates.contains(&carried));
    }

    #[test]
    fn test_destroyed_entities_drop_out() {
        let (mut graph, [a, mover, _, _]) = sample();
        graph.destroy(a).unwrap();

        assert!(SiblingScope.candidates(&graph, mover).is_empty());
        assert_eq!(from_scope(QueryScope::Scene).candidates(&graph, mover), vec![graph.root()]);
    }
}
