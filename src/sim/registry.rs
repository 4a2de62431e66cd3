//! Entity registry
//!
//! Ordered list of every spawnable owned by the current episode. Entities do
//! not point back at the registry; whoever destroys an entity reports it
//! here through [`Registry::deregister`], which tolerates repeat calls so a
//! sweep and a collision racing in the same tick cannot double-remove.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, Spawnable};
use super::physics::{BodyId, PhysicsWorld};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    /// Live entries in registration order
    entries: Vec<Spawnable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly spawned entity.
    ///
    /// Registering a body that is already tracked is ignored.
    pub fn register(&mut self, entity: Spawnable) -> bool {
        if self.contains(entity.body) {
            log::warn!("Body {:?} registered twice; ignoring", entity.body);
            return false;
        }
        self.entries.push(entity);
        true
    }

    /// Stop tracking an entity. Returns None if it was not (or no longer) tracked.
    pub fn deregister(&mut self, body: BodyId) -> Option<Spawnable> {
        let idx = self.entries.iter().position(|e| e.body == body)?;
        Some(self.entries.remove(idx))
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.entries.iter().any(|e| e.body == body)
    }

    pub fn get(&self, body: BodyId) -> Option<&Spawnable> {
        self.entries.iter().find(|e| e.body == body)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spawnable> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Spawnable> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tracked entities of one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entries
            .iter()
            .filter(|e| e.entity_kind() == kind)
            .count()
    }

    /// Remove and return every entry (for episode reset)
    pub fn drain(&mut self) -> Vec<Spawnable> {
        std::mem::take(&mut self.entries)
    }

    /// Nearest live entity of a kind by Euclidean distance.
    ///
    /// Linear scan; ties go to the earlier registration.
    pub fn nearest(&self, kind: EntityKind, point: Vec2, world: &PhysicsWorld) -> Option<BodyId> {
        let mut best: Option<(BodyId, f32)> = None;
        for entry in self.entries.iter().filter(|e| e.entity_kind() == kind) {
            let Some(body) = world.get(entry.body) else {
                continue;
            };
            let dist = body.pos.distance_squared(point);
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((entry.body, dist));
            }
        }
        best.map(|(id, _)| id)
    }
}
