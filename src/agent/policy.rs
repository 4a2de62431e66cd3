//! Policy seam
//!
//! A policy turns what the ship can see into an [`Action`]. The simulation
//! treats every policy as opaque; it only promises a [`DecisionContext`]
//! built at decision time.

use glam::Vec2;

use super::action::Action;
use super::observation::Observation;
use crate::sim::entity::EntityKind;
use crate::sim::physics::{LayerMask, PhysicsWorld};
use crate::sim::registry::Registry;

/// What a policy may inspect when deciding
pub struct DecisionContext<'a> {
    pub observation: Observation,
    pub ship_pos: Vec2,
    /// Heading in degrees (unwrapped)
    pub ship_heading: f32,
    /// Unit vector the ship is facing
    pub forward: Vec2,
    world: &'a PhysicsWorld,
    registry: &'a Registry,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        observation: Observation,
        ship_pos: Vec2,
        ship_heading: f32,
        world: &'a PhysicsWorld,
        registry: &'a Registry,
    ) -> Self {
        Self {
            observation,
            ship_pos,
            ship_heading,
            forward: crate::forward_from_heading(ship_heading),
            world,
            registry,
        }
    }

    /// Position of the closest live asteroid
    pub fn nearest_asteroid(&self) -> Option<Vec2> {
        self.registry
            .nearest(EntityKind::Asteroid, self.ship_pos, self.world)
            .and_then(|id| self.world.get(id))
            .map(|body| body.pos)
    }

    /// Whether a ray along the ship's heading hits an asteroid at any range
    pub fn forward_ray_hits_asteroid(&self) -> bool {
        self.world
            .raycast(
                self.ship_pos,
                self.forward,
                f32::INFINITY,
                LayerMask::of(EntityKind::Asteroid.layer()),
            )
            .is_some()
    }
}

/// Anything that can drive the ship
pub trait Policy {
    /// Short identifier for logs
    fn id(&self) -> &'static str;

    /// Called after every episode reset
    fn on_episode_begin(&mut self, _episode: u64) {}

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action;
}

/// Adapter for an external model that only needs the observation
pub struct FnPolicy<F> {
    id: &'static str,
    f: F,
}

impl<F> FnPolicy<F>
where
    F: FnMut(&Observation) -> Action,
{
    pub fn new(id: &'static str, f: F) -> Self {
        Self { id, f }
    }
}

impl<F> Policy for FnPolicy<F>
where
    F: FnMut(&Observation) -> Action,
{
    fn id(&self) -> &'static str {
        self.id
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
        (self.f)(&ctx.observation)
    }
}
