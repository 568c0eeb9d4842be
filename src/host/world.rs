//! Position/rendering collaborator.
//!
//! The core never moves anything itself. It asks the world to make one
//! entity follow another and then polls [`World::overlaps`] between ticks.

use serde::{Deserialize, Serialize};

/// Opaque identity of an entity owned by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an entity represents, used by hosts to pick sprites and hitboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Robot,
    Item,
    Bin,
}

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Create a position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance. Enough for nearest-neighbour comparisons.
    pub fn distance_squared(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    pub fn distance(&self, other: &Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Move toward `target` by at most `step`, never overshooting.
    pub fn step_toward(&self, target: &Position, step: f32) -> Position {
        let distance = self.distance(target);
        if distance <= step || distance == 0.0 {
            return *target;
        }
        let ratio = step / distance;
        Position {
            x: self.x + (target.x - self.x) * ratio,
            y: self.y + (target.y - self.y) * ratio,
        }
    }
}

/// Host-side world of positioned entities.
pub trait World {
    /// Create an entity at a position and return its identity.
    fn spawn(&mut self, kind: EntityKind, position: Position) -> EntityId;

    /// Current position, or `None` for a destroyed or unknown entity.
    fn position(&self, id: EntityId) -> Option<Position>;

    /// Teleport an entity.
    fn set_position(&mut self, id: EntityId, position: Position);

    /// Make `follower` chase `target` at `speed` units per second until told
    /// otherwise. Replaces any previous follow order for `follower`.
    fn follow(&mut self, follower: EntityId, target: EntityId, speed: f32);

    /// Whether two entities are in contact.
    fn overlaps(&self, a: EntityId, b: EntityId) -> bool;

    /// Remove an entity. Unknown identities are ignored.
    fn destroy(&mut self, id: EntityId);

    /// Advance the world by one frame.
    fn tick(&mut self);
}
