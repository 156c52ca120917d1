//! Swept movement with sliding response
//!
//! A move from `from` to `to` is cut into fixed-length steps. Each step
//! places the mover tentatively one step further along the path and tests
//! every collider pair against that single snapshot. If nothing blocks, the
//! tentative position is committed. If something blocks, the direction is
//! projected onto the blocking surfaces and the mover slides one step along
//! them instead, or holds when no slide is possible.
//!
//! The sweep is driven one step at a time ([`MovementResolver::begin`],
//! [`MovementResolver::step`], [`MovementResolver::finish`]) so the caller
//! can dispatch callbacks between steps and re-check the tree. Callers with
//! no callbacks to run can use [`MovementResolver::resolve`].

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::config::{LayerPolicy, PhysicsConfig};
use crate::foundation::math::{Transform, Vec3};
use crate::physics::collider::Collider;
use crate::physics::collision_layers::CollisionLayers;
use crate::physics::triggers::{PairContact, PairKey, TriggerTracker, TriggerTransitions};
use crate::scene::scene_graph::{EntityId, SceneGraph};
use crate::spatial::spatial_query::{self, SpatialQuery};

/// Slides shorter than this are treated as a full stop
const MIN_SLIDE_LENGTH: f32 = 1e-6;

/// Counters for one resolved move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStats {
    /// Steps taken
    pub steps: u32,
    /// Collider pairs examined, filtered pairs included
    pub pair_tests: u32,
    /// Blocking contacts found across all steps
    pub blocking_contacts: u32,
    /// Steps that committed a slid position
    pub slid_steps: u32,
    /// Steps that held position
    pub held_steps: u32,
}

/// An in-flight move of one entity
#[derive(Debug, Clone)]
pub struct Sweep {
    mover: EntityId,
    target: Vec3,
    current: Vec3,
    direction: Vec3,
    distance: f32,
    step_length: f32,
    steps_total: u32,
    step_index: u32,
    clean: bool,
    touching: BTreeSet<PairKey>,
    stats: MoveStats,
}

impl Sweep {
    /// The moving entity
    pub fn mover(&self) -> EntityId {
        self.mover
    }

    /// Position committed so far, in the parent's space
    pub fn position(&self) -> Vec3 {
        self.current
    }

    /// Whether every step has been taken
    pub fn is_finished(&self) -> bool {
        self.step_index >= self.steps_total
    }

    /// Counters so far
    pub fn stats(&self) -> &MoveStats {
        &self.stats
    }

    fn next_step_length(&self) -> f32 {
        let travelled = self.step_length * self.step_index as f32;
        (self.distance - travelled).clamp(0.0, self.step_length)
    }
}

/// What one step produced for the caller to dispatch
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Blocking contacts that began on this step
    pub began: Vec<PairContact>,
    /// Trigger edges at the committed position
    pub triggers: TriggerTransitions,
}

/// Result of [`MovementResolver::resolve`]
#[derive(Debug, Clone, Default)]
pub struct MoveOutcome {
    /// Final position in the parent's space
    pub position: Vec3,
    /// Blocking contacts, each reported on the step it began
    pub collisions: Vec<PairContact>,
    /// Trigger edges in the order they happened
    pub triggers: TriggerTransitions,
    /// Counters
    pub stats: MoveStats,
}

#[derive(Default)]
struct Overlaps {
    blocking: Vec<PairContact>,
    triggers: Vec<PairContact>,
}

/// Fixed-step sweep and trigger state for every mover in a scene
pub struct MovementResolver {
    config: PhysicsConfig,
    fallback_normal: Vec3,
    query: Box<dyn SpatialQuery>,
    triggers: TriggerTracker,
    last_stats: MoveStats,
}

impl std::fmt::Debug for MovementResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementResolver")
            .field("config", &self.config)
            .field("query", &self.query.name())
            .field("last_stats", &self.last_stats)
            .finish_non_exhaustive()
    }
}

impl Default for MovementResolver {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl MovementResolver {
    /// Create a resolver using the query scope named in `config`
    pub fn new(config: PhysicsConfig) -> Self {
        let query = spatial_query::from_scope(config.query_scope);
        Self::with_query(config, query)
    }

    /// Create a resolver with a custom candidate query
    pub fn with_query(config: PhysicsConfig, query: Box<dyn SpatialQuery>) -> Self {
        Self {
            fallback_normal: config.fallback_normal_vec(),
            config,
            query,
            triggers: TriggerTracker::new(),
            last_stats: MoveStats::default(),
        }
    }

    /// Active settings
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Swap the candidate query
    pub fn set_spatial_query(&mut self, query: Box<dyn SpatialQuery>) {
        self.query = query;
    }

    /// Trigger overlap state
    pub fn triggers(&self) -> &TriggerTracker {
        &self.triggers
    }

    /// Counters of the most recently finished move
    pub fn last_stats(&self) -> MoveStats {
        self.last_stats
    }

    /// Drop trigger state involving a destroyed entity
    pub fn forget(&mut self, entity: EntityId) {
        self.triggers.forget(entity);
    }

    /// Start moving `mover` from `from` to `to`, both in its parent's space
    ///
    /// A zero-length move yields a sweep that is already finished. A mover
    /// without colliders covers the whole distance in a single step.
    ///
    /// # Panics
    /// If `mover` is the root or is not attached to the tree.
    pub fn begin(&self, graph: &SceneGraph, mover: EntityId, from: Vec3, to: Vec3) -> Sweep {
        assert!(mover != graph.root(), "cannot resolve a move for the root entity");
        assert!(
            graph.is_in_tree(mover),
            "cannot resolve a move for {mover:?}: entity is not attached to the scene"
        );

        let displacement = to - from;
        let distance = displacement.norm();
        let (direction, step_length, steps_total) = if distance > 0.0 {
            let step_length = if graph.colliders(mover).is_empty() {
                distance
            } else {
                self.config.max_step_length
            };
            let steps = (distance / step_length).ceil().max(1.0) as u32;
            (displacement / distance, step_length, steps)
        } else {
            (Vec3::zeros(), 0.0, 0)
        };

        Sweep {
            mover,
            target: to,
            current: from,
            direction,
            distance,
            step_length,
            steps_total,
            step_index: 0,
            clean: true,
            touching: BTreeSet::new(),
            stats: MoveStats::default(),
        }
    }

    /// Take the next step of `sweep`
    ///
    /// Candidates are re-read from the tree on every call.
    pub fn step(&mut self, sweep: &mut Sweep, graph: &SceneGraph) -> StepReport {
        if sweep.is_finished() {
            return StepReport::default();
        }

        let mover = sweep.mover;
        let step = sweep.next_step_length();
        let last = sweep.step_index + 1 == sweep.steps_total;
        let tentative = if last && sweep.clean {
            sweep.target
        } else {
            sweep.current + sweep.direction * step
        };

        let parent_world = graph.parent_world_transform(mover);
        let local = graph.local_transform(mover).copied().unwrap_or_default();
        let pose_at = |position: Vec3| parent_world.combine(&Transform { position, ..local });

        let candidates = self.query.candidates(graph, mover);
        let hits = self.overlaps_at(graph, mover, &pose_at(tentative), &candidates, false, &mut sweep.stats);

        let (committed, trigger_sample) = if hits.blocking.is_empty() {
            (tentative, hits.triggers)
        } else {
            sweep.clean = false;
            sweep.stats.blocking_contacts += hits.blocking.len() as u32;
            for pair in &hits.blocking {
                trace!(
                    "{:?} blocked by {:?} at {:?}, normal {:?}",
                    mover, pair.contact.other, pair.contact.point, pair.contact.normal
                );
            }

            let next = match slide_direction(sweep.direction, &hits.blocking) {
                Some(slide) => {
                    sweep.stats.slid_steps += 1;
                    sweep.current + slide * step
                }
                None => {
                    sweep.stats.held_steps += 1;
                    sweep.current
                }
            };
            let sample = self
                .overlaps_at(graph, mover, &pose_at(next), &candidates, true, &mut sweep.stats)
                .triggers;
            (next, sample)
        };

        let began = hits
            .blocking
            .iter()
            .filter(|pair| !sweep.touching.contains(&pair.key))
            .copied()
            .collect();
        sweep.touching = hits.blocking.iter().map(|pair| pair.key).collect();

        let triggers = self.triggers.update(mover, trigger_sample, &candidates);
        for pair in &triggers.exited {
            debug!("{:?} left trigger pair {:?}", mover, pair.key);
        }
        for pair in &triggers.entered {
            debug!("{:?} entered trigger pair {:?}", mover, pair.key);
        }

        sweep.current = committed;
        sweep.step_index += 1;
        sweep.stats.steps += 1;

        StepReport { began, triggers }
    }

    /// Close `sweep`, record its counters and return the final position
    pub fn finish(&mut self, sweep: Sweep) -> Vec3 {
        debug!(
            "{:?} moved to {:?} ({} steps, {} pair tests, {} blocking, {} slid, {} held)",
            sweep.mover,
            sweep.current,
            sweep.stats.steps,
            sweep.stats.pair_tests,
            sweep.stats.blocking_contacts,
            sweep.stats.slid_steps,
            sweep.stats.held_steps,
        );
        self.last_stats = sweep.stats;
        sweep.current
    }

    /// Run a whole move without interleaving callbacks
    ///
    /// # Panics
    /// If `mover` is the root or is not attached to the tree.
    pub fn resolve(&mut self, graph: &SceneGraph, mover: EntityId, from: Vec3, to: Vec3) -> MoveOutcome {
        let mut sweep = self.begin(graph, mover, from, to);
        let mut outcome = MoveOutcome::default();
        while !sweep.is_finished() {
            let report = self.step(&mut sweep, graph);
            outcome.collisions.extend(report.began);
            outcome.triggers.exited.extend(report.triggers.exited);
            outcome.triggers.entered.extend(report.triggers.entered);
        }
        outcome.stats = sweep.stats;
        outcome.position = self.finish(sweep);
        outcome
    }

    fn accepts(&self, own: &Collider, other: &Collider) -> bool {
        match self.config.layer_policy {
            LayerPolicy::Initiator => own.can_interact_with(other),
            LayerPolicy::Mutual => {
                CollisionLayers::should_collide(own.layer(), own.mask(), other.layer(), other.mask())
            }
        }
    }

    /// Test every mover collider against every candidate collider at `pose`
    fn overlaps_at(
        &self,
        graph: &SceneGraph,
        mover: EntityId,
        pose: &Transform,
        candidates: &[EntityId],
        triggers_only: bool,
        stats: &mut MoveStats,
    ) -> Overlaps {
        let mut hits = Overlaps::default();
        let own_colliders = graph.colliders(mover);

        for &other in candidates {
            let other_colliders = graph.colliders(other);
            if other == mover || other_colliders.is_empty() {
                continue;
            }
            let Some(other_pose) = graph.get_world_transform(other) else {
                continue;
            };

            for (i, own) in own_colliders.iter().enumerate() {
                for (j, theirs) in other_colliders.iter().enumerate() {
                    let blocking = !own.is_trigger() && !theirs.is_trigger();
                    if triggers_only && blocking {
                        continue;
                    }
                    stats.pair_tests += 1;
                    // Trigger pairs are shared by both sides, so either side's mask admits them
                    let accepted = if blocking {
                        self.accepts(own, theirs)
                    } else {
                        self.accepts(own, theirs) || self.accepts(theirs, own)
                    };
                    if !accepted {
                        continue;
                    }

                    let Some(contact) = own.overlap_contact(
                        pose,
                        theirs,
                        &other_pose,
                        self.config.contact_normal,
                        self.fallback_normal,
                    ) else {
                        continue;
                    };

                    let pair = PairContact {
                        key: PairKey {
                            mover_collider: i,
                            other,
                            other_collider: j,
                        },
                        contact,
                        mover_layer: own.layer(),
                    };
                    if blocking {
                        hits.blocking.push(pair);
                    } else {
                        hits.triggers.push(pair);
                    }
                }
            }
        }

        hits
    }
}

/// Direction left after removing the components pushing into each surface
///
/// Contact normals point from the mover toward the obstacle, so the surface
/// normal is the negated contact normal. Contacts are applied in order to a
/// running direction. Returns `None` when no contact was pushed into, or
/// when the projections cancel the direction out.
pub fn slide_direction(direction: Vec3, contacts: &[PairContact]) -> Option<Vec3> {
    let mut slide = direction;
    let mut projected = false;

    for pair in contacts {
        let surface = -pair.contact.normal;
        let into = slide.dot(&surface);
        if into < 0.0 {
            slide -= surface * into;
            projected = true;
        }
    }

    if projected {
        slide.try_normalize(MIN_SLIDE_LENGTH)
    } else {
        None
    }
}
