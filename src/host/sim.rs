//! Fixed-timestep kinematic world.
//!
//! A stand-in for a sprite engine: entities are points, following moves a
//! follower straight at its target's current position, and two entities
//! overlap when they are within the contact radius.

use std::collections::BTreeMap;

use crate::host::world::{EntityId, EntityKind, Position, World};

#[derive(Debug, Clone)]
struct Entity {
    kind: EntityKind,
    position: Position,
    follow: Option<(EntityId, f32)>,
}

/// In-process world used by the CLI and by tests.
#[derive(Debug, Clone)]
pub struct SimWorld {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    /// Seconds per tick.
    dt: f32,
    contact_radius: f32,
    ticks: u64,
}

impl SimWorld {
    /// Create an empty world running at `tick_rate` ticks per second.
    pub fn new(tick_rate: u32, contact_radius: f32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            dt: 1.0 / tick_rate.max(1) as f32,
            contact_radius,
            ticks: 0,
        }
    }

    /// Ticks elapsed since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live entities of one kind, in spawn order.
    pub fn entities_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    /// The follow order of an entity, if any.
    pub fn following(&self, id: EntityId) -> Option<EntityId> {
        self.entities
            .get(&id)
            .and_then(|e| e.follow)
            .map(|(target, _)| target)
    }
}

impl World for SimWorld {
    fn spawn(&mut self, kind: EntityKind, position: Position) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            Entity {
                kind,
                position,
                follow: None,
            },
        );
        id
    }

    fn position(&self, id: EntityId) -> Option<Position> {
        self.entities.get(&id).map(|e| e.position)
    }

    fn set_position(&mut self, id: EntityId, position: Position) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = position;
        }
    }

    fn follow(&mut self, follower: EntityId, target: EntityId, speed: f32) {
        if let Some(entity) = self.entities.get_mut(&follower) {
            entity.follow = Some((target, speed));
        }
    }

    fn overlaps(&self, a: EntityId, b: EntityId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa.distance(&pb) <= self.contact_radius,
            _ => false,
        }
    }

    fn destroy(&mut self, id: EntityId) {
        self.entities.remove(&id);
    }

    fn tick(&mut self) {
        // Entities move in id order and see positions already updated this
        // tick, like sprites updated one after another in a frame.
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            let Some((target, speed)) = self.entities.get(&id).and_then(|e| e.follow) else {
                continue;
            };
            let Some(target_pos) = self.position(target) else {
                // Target destroyed: stop following.
                if let Some(entity) = self.entities.get_mut(&id) {
                    entity.follow = None;
                }
                continue;
            };
            let step = speed * self.dt;
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.position = entity.position.step_toward(&target_pos, step);
            }
        }
        self.ticks += 1;
    }
}
