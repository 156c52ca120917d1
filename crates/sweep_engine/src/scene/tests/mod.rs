//! Scenario tests for the scene runtime
//!
//! Behaviors here record what happened to a shared log so the tests can
//! assert on callback order as well as final positions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::Vec3;
use crate::physics::collider::Contact;
use crate::physics::collision_layers::CollisionLayer;
use crate::scene::behavior::{Behavior, EntityContext};
use crate::scene::scene_graph::EntityId;


/// One recorded hook call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Init(&'static str),
    Update(&'static str),
    Collision {
        who: &'static str,
        other: EntityId,
        other_layer: CollisionLayer,
        normal: Vec3,
    },
    Enter(&'static str, EntityId),
    Exit(&'static str, EntityId),
}

pub(crate) type Log = Rc<RefCell<Vec<Event>>>;

pub(crate) fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Collision events recorded for `who`
pub(crate) fn collisions_of(log: &Log, who: &'static str) -> Vec<Event> {
    log.borrow()
        .iter()
        .filter(|event| matches!(event, Event::Collision { who: w, .. } if *w == who))
        .cloned()
        .collect()
}

/// What a [`Recorder`] does after logging a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnHit {
    Nothing,
    DestroySelf,
    DestroyOther,
}

/// Logs every hook; optionally walks with a constant velocity
pub(crate) struct Recorder {
    pub name: &'static str,
    pub log: Log,
    pub velocity: Vec3,
    pub on_hit: OnHit,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            velocity: Vec3::zeros(),
            on_hit: OnHit::Nothing,
        }
    }

    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn on_hit(mut self, on_hit: OnHit) -> Self {
        self.on_hit = on_hit;
        self
    }
}

impl Behavior for Recorder {
    fn on_init(&mut self, _ctx: &mut EntityContext<'_>) {
        self.log.borrow_mut().push(Event::Init(self.name));
    }

    fn on_update(&mut self, ctx: &mut EntityContext<'_>, delta_time: f32) {
        self.log.borrow_mut().push(Event::Update(self.name));
        if self.velocity != Vec3::zeros() {
            ctx.translate(self.velocity * delta_time);
        }
    }

    fn on_collision(&mut self, ctx: &mut EntityContext<'_>, contact: &Contact) {
        self.log.borrow_mut().push(Event::Collision {
            who: self.name,
            other: contact.other,
            other_layer: contact.other_layer,
            normal: contact.normal,
        });
        match self.on_hit {
            OnHit::Nothing => {}
            OnHit::DestroySelf => ctx.destroy(),
            OnHit::DestroyOther => {
                let _ = ctx.scene_mut().destroy(contact.other);
            }
        }
    }

    fn on_trigger_enter(&mut self, _ctx: &mut EntityContext<'_>, contact: &Contact) {
        self.log.borrow_mut().push(Event::Enter(self.name, contact.other));
    }

    fn on_trigger_exit(&mut self, _ctx: &mut EntityContext<'_>, contact: &Contact) {
        self.log.borrow_mut().push(Event::Exit(self.name, contact.other));
    }
}
