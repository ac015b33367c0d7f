//! Playfield object registry
//!
//! The physics core only knows shapes; game logic thinks in named elements.
//! [`Playfield`] maps [`ObjectHandle`]s to names and the colliders they own,
//! and implements [`EventSink`] so every hit is attributed to its element.

use std::collections::HashMap;

use pinball_physics::{ColliderId, EventSink, HitEvent, HitTarget, ObjectHandle, PhysicsEvent, TimerId};

/// Runtime state of one named playfield element
#[derive(Debug, Clone, PartialEq)]
pub struct PlayfieldObject {
    /// Element name from the table file
    pub name: String,
    /// Colliders created for this element
    pub colliders: Vec<ColliderId>,
    /// Number of reported hits
    pub hit_count: u32,
    /// Impact speed of the most recent reported hit
    pub last_hit_speed: f32,
}

/// Registry of playfield elements and the event log of the running table
#[derive(Debug, Default)]
pub struct Playfield {
    objects: Vec<PlayfieldObject>,
    name_index: HashMap<String, ObjectHandle>,
    ball_hits: u32,
    events: Vec<PhysicsEvent>,
}

impl Playfield {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element; returns the existing handle if the name is taken
    pub fn add_object(&mut self, name: impl Into<String>) -> ObjectHandle {
        let name = name.into();
        if let Some(&handle) = self.name_index.get(&name) {
            return handle;
        }
        let handle = ObjectHandle(self.objects.len() as u32);
        self.name_index.insert(name.clone(), handle);
        self.objects.push(PlayfieldObject {
            name,
            colliders: Vec::new(),
            hit_count: 0,
            last_hit_speed: 0.0,
        });
        handle
    }

    /// Record that `collider` belongs to `handle`
    pub fn attach_collider(&mut self, handle: ObjectHandle, collider: ColliderId) -> bool {
        match self.objects.get_mut(handle.0 as usize) {
            Some(object) => {
                object.colliders.push(collider);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&PlayfieldObject> {
        self.objects.get(handle.0 as usize)
    }

    /// Look an element up by name
    pub fn get_by_name(&self, name: &str) -> Option<(ObjectHandle, &PlayfieldObject)> {
        let handle = *self.name_index.get(name)?;
        self.get(handle).map(|object| (handle, object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all elements with their handles
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &PlayfieldObject)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectHandle(i as u32), object))
    }

    /// Number of reported ball-ball impacts
    pub fn ball_hits(&self) -> u32 {
        self.ball_hits
    }

    /// Events collected since the last drain
    pub fn events(&self) -> &[PhysicsEvent] {
        &self.events
    }

    /// Take the collected events, leaving the log empty
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reset hit counters (e.g. for a new game)
    pub fn reset_counters(&mut self) {
        for object in &mut self.objects {
            object.hit_count = 0;
            object.last_hit_speed = 0.0;
        }
        self.ball_hits = 0;
    }
}

impl EventSink for Playfield {
    fn on_hit(&mut self, hit: &HitEvent) {
        match (hit.owner, hit.event.target) {
            (Some(handle), _) => match self.objects.get_mut(handle.0 as usize) {
                Some(object) => {
                    object.hit_count += 1;
                    object.last_hit_speed = hit.impact_speed;
                    log::trace!("Ball {} hit '{}' at speed {}", hit.ball_id, object.name, hit.impact_speed);
                }
                None => log::warn!("Hit reported for unknown playfield object {:?}", handle),
            },
            (None, HitTarget::Ball(_)) => self.ball_hits += 1,
            (None, HitTarget::Shape(_)) => {}
        }
        self.events.push(PhysicsEvent::Hit(*hit));
    }

    fn on_timer(&mut self, timer: TimerId) {
        self.events.push(PhysicsEvent::Timer(timer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinball_math::Vec3;
    use pinball_physics::{BallKey, CollisionEvent, Impact};

    fn hit(owner: Option<ObjectHandle>, target: HitTarget, speed: f32) -> HitEvent {
        HitEvent {
            ball: BallKey::default(),
            ball_id: 0,
            owner,
            impact_speed: speed,
            event: CollisionEvent::new(Impact::collision(0.0, Vec3::Z, 0.0, -speed), target),
        }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut playfield = Playfield::new();
        let left = playfield.add_object("left_sling");
        let right = playfield.add_object("right_sling");
        assert_ne!(left, right);
        assert_eq!(playfield.len(), 2);

        let (handle, object) = playfield.get_by_name("right_sling").unwrap();
        assert_eq!(handle, right);
        assert_eq!(object.name, "right_sling");
        assert!(playfield.get_by_name("plunger").is_none());
    }

    #[test]
    fn test_duplicate_name_returns_same_handle() {
        let mut playfield = Playfield::new();
        let first = playfield.add_object("bumper");
        let second = playfield.add_object("bumper");
        assert_eq!(first, second);
        assert_eq!(playfield.len(), 1);
    }

    #[test]
    fn test_hits_are_attributed() {
        let mut playfield = Playfield::new();
        let bumper = playfield.add_object("bumper");
        assert!(playfield.attach_collider(bumper, ColliderId(2)));

        playfield.on_hit(&hit(Some(bumper), HitTarget::Shape(ColliderId(2)), 7.5));
        playfield.on_hit(&hit(Some(bumper), HitTarget::Shape(ColliderId(2)), 3.0));
        playfield.on_hit(&hit(None, HitTarget::Ball(BallKey::default()), 1.0));

        let object = playfield.get(bumper).unwrap();
        assert_eq!(object.hit_count, 2);
        assert_eq!(object.last_hit_speed, 3.0);
        assert_eq!(object.colliders, vec![ColliderId(2)]);
        assert_eq!(playfield.ball_hits(), 1);
        assert_eq!(playfield.events().len(), 3);
    }

    #[test]
    fn test_drain_and_reset() {
        let mut playfield = Playfield::new();
        let target = playfield.add_object("target");
        playfield.on_hit(&hit(Some(target), HitTarget::Shape(ColliderId(5)), 2.0));
        playfield.on_timer(TimerId(1));

        let events = playfield.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], PhysicsEvent::Timer(TimerId(1)));
        assert!(playfield.events().is_empty());

        playfield.reset_counters();
        assert_eq!(playfield.get(target).unwrap().hit_count, 0);
    }
}
