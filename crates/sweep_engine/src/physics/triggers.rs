//! Trigger overlap tracking
//!
//! Enter and exit edges cannot be read off a single overlap test; they need
//! the set of pairs that overlapped last time. The tracker keeps one record
//! per unordered collider pair, so whichever side moves reads and updates
//! the same record, and turns each fresh sample into the edges that changed.

use std::collections::{BTreeMap, BTreeSet};

use slotmap::SecondaryMap;

use crate::physics::collider::Contact;
use crate::physics::collision_layers::CollisionLayer;
use crate::scene::scene_graph::EntityId;

/// Identifies one collider pair from a mover's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    /// Index of the mover's collider
    pub mover_collider: usize,
    /// The other entity
    pub other: EntityId,
    /// Index of the other entity's collider
    pub other_collider: usize,
}

/// A contact together with the pair that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContact {
    /// Which pair
    pub key: PairKey,
    /// Contact as seen by the mover
    pub contact: Contact,
    /// Layer of the mover's collider, for the mirrored contact
    pub mover_layer: CollisionLayer,
}

impl PairContact {
    /// The contact as seen by the other entity
    pub fn mirrored(&self, mover: EntityId) -> Contact {
        self.contact.mirrored(mover, self.mover_layer)
    }

    /// The same pair described from the other entity's side
    fn flipped(&self, mover: EntityId) -> PairContact {
        PairContact {
            key: PairKey {
                mover_collider: self.key.other_collider,
                other: mover,
                other_collider: self.key.mover_collider,
            },
            contact: self.mirrored(mover),
            mover_layer: self.contact.other_layer,
        }
    }
}

/// Edges produced by one overlap sample
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerTransitions {
    /// Pairs overlapping now but not before
    pub entered: Vec<PairContact>,
    /// Pairs overlapping before but not now, with their last contact
    pub exited: Vec<PairContact>,
}

impl TriggerTransitions {
    /// No edges
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// One collider of one entity
type ColliderEnd = (EntityId, usize);

/// Unordered collider pair, lower end first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PairId {
    low: ColliderEnd,
    high: ColliderEnd,
}

impl PairId {
    fn new(mover: EntityId, key: &PairKey) -> Self {
        let a = (mover, key.mover_collider);
        let b = (key.other, key.other_collider);
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    fn other_end(&self, entity: EntityId) -> ColliderEnd {
        if self.low.0 == entity {
            self.high
        } else {
            self.low
        }
    }
}

/// Last sample of an overlapping pair, as seen by whoever moved last
#[derive(Debug, Clone, Copy)]
struct Overlap {
    seen_by: EntityId,
    pair: PairContact,
}

impl Overlap {
    fn view_from(&self, entity: EntityId) -> PairContact {
        if entity == self.seen_by {
            self.pair
        } else {
            self.pair.flipped(self.seen_by)
        }
    }
}

/// Trigger overlap state shared by every mover
#[derive(Debug, Default)]
pub struct TriggerTracker {
    pairs: BTreeMap<PairId, Overlap>,
    by_entity: SecondaryMap<EntityId, BTreeSet<PairId>>,
}

impl TriggerTracker {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fresh sample taken by `mover` into the pair state and report
    /// what changed, from the mover's side
    ///
    /// `scope` lists the entities the sample covered. Pairs with entities
    /// outside it are left alone, since this sample says nothing about them.
    /// Exits are listed before enters, each in key order.
    pub fn update(&mut self, mover: EntityId, sample: Vec<PairContact>, scope: &[EntityId]) -> TriggerTransitions {
        let current: BTreeMap<PairId, PairContact> = sample
            .into_iter()
            .map(|pair| (PairId::new(mover, &pair.key), pair))
            .collect();

        let gone: Vec<PairId> = self
            .by_entity
            .get(mover)
            .into_iter()
            .flatten()
            .filter(|id| !current.contains_key(*id) && scope.contains(&id.other_end(mover).0))
            .copied()
            .collect();
        let mut exited: Vec<PairContact> = gone
            .into_iter()
            .filter_map(|id| self.remove(id))
            .map(|overlap| overlap.view_from(mover))
            .collect();

        let mut entered = Vec::new();
        for (id, pair) in current {
            if !self.pairs.contains_key(&id) {
                entered.push(pair);
            }
            self.insert(id, Overlap { seen_by: mover, pair });
        }

        exited.sort_by_key(|pair| pair.key);
        entered.sort_by_key(|pair| pair.key);
        TriggerTransitions { entered, exited }
    }

    /// Whether `entity` currently overlaps any trigger pair with `other`
    pub fn is_overlapping(&self, entity: EntityId, other: EntityId) -> bool {
        self.by_entity
            .get(entity)
            .is_some_and(|ids| ids.iter().any(|id| id.other_end(entity).0 == other))
    }

    /// Pairs `entity` currently overlaps, described from its side
    pub fn overlapping(&self, entity: EntityId) -> impl Iterator<Item = PairContact> + '_ {
        self.by_entity
            .get(entity)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.pairs.get(id))
            .map(move |overlap| overlap.view_from(entity))
    }

    /// Drop all pairs involving `entity`
    ///
    /// No exit edges are reported for the pairs removed this way.
    pub fn forget(&mut self, entity: EntityId) {
        let Some(ids) = self.by_entity.remove(entity) else {
            return;
        };
        for id in ids {
            self.pairs.remove(&id);
            self.unindex(id.other_end(entity).0, id);
        }
    }

    fn insert(&mut self, id: PairId, overlap: Overlap) {
        self.pairs.insert(id, overlap);
        for entity in [id.low.0, id.high.0] {
            if let Some(entry) = self.by_entity.entry(entity) {
                entry.or_default().insert(id);
            }
        }
    }

    fn remove(&mut self, id: PairId) -> Option<Overlap> {
        let overlap = self.pairs.remove(&id)?;
        self.unindex(id.low.0, id);
        self.unindex(id.high.0, id);
        Some(overlap)
    }

    fn unindex(&mut self, entity: EntityId, id: PairId) {
        if let Some(ids) = self.by_entity.get_mut(entity) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_entity.remove(entity);
            }
        }
    }
}
