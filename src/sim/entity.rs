//! Spawnable entities: asteroids and bullets
//!
//! A spawnable is a physics body plus the lifecycle data the episode needs
//! (asteroid size, remaining lifetime). The body itself lives in the
//! [`PhysicsWorld`](super::physics::PhysicsWorld); entities only hold its id.

use serde::{Deserialize, Serialize};

use super::physics::{BodyId, Layer};

/// Entity kind, used for registry queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Asteroid,
    Bullet,
}

impl EntityKind {
    pub fn layer(self) -> Layer {
        match self {
            EntityKind::Asteroid => Layer::Asteroid,
            EntityKind::Bullet => Layer::Bullet,
        }
    }
}

/// Per-kind lifecycle data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnKind {
    Asteroid {
        size: f32,
        /// Seconds left before expiry (None = swept by distance)
        lifetime: Option<f32>,
    },
    Bullet {
        lifetime: f32,
    },
}

/// A registered spawnable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawnable {
    pub body: BodyId,
    pub kind: SpawnKind,
}

impl Spawnable {
    pub fn asteroid(body: BodyId, size: f32, lifetime: Option<f32>) -> Self {
        Self {
            body,
            kind: SpawnKind::Asteroid { size, lifetime },
        }
    }

    pub fn bullet(body: BodyId, lifetime: f32) -> Self {
        Self {
            body,
            kind: SpawnKind::Bullet { lifetime },
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self.kind {
            SpawnKind::Asteroid { .. } => EntityKind::Asteroid,
            SpawnKind::Bullet { .. } => EntityKind::Bullet,
        }
    }

    /// Asteroid size, if this is an asteroid
    pub fn size(&self) -> Option<f32> {
        match self.kind {
            SpawnKind::Asteroid { size, .. } => Some(size),
            SpawnKind::Bullet { .. } => None,
        }
    }

    /// True when this entity is removed by the distance sweep
    pub fn expires_by_distance(&self) -> bool {
        matches!(self.kind, SpawnKind::Asteroid { lifetime: None, .. })
    }

    /// Count down the lifetime; returns true once it has run out
    pub fn age(&mut self, dt: f32) -> bool {
        let remaining = match &mut self.kind {
            SpawnKind::Asteroid {
                lifetime: Some(t), ..
            } => t,
            SpawnKind::Bullet { lifetime } => lifetime,
            SpawnKind::Asteroid { lifetime: None, .. } => return false,
        };
        *remaining -= dt;
        *remaining <= crate::consts::TIME_EPSILON
    }
}

/// Collision radius of an asteroid of the given size
#[inline]
pub fn asteroid_radius(size: f32) -> f32 {
    size * 0.5
}

/// Size of each child when an asteroid splits.
///
/// A split produces two children of half the parent size, but only when the
/// half is still at least `min_size`; otherwise the asteroid is simply
/// destroyed.
#[inline]
pub fn split_size(size: f32, min_size: f32) -> Option<f32> {
    let half = size * 0.5;
    (half >= min_size).then_some(half)
}
