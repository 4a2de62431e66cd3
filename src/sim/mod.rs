//! Deterministic simulation module
//!
//! All episode logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod entity;
pub mod physics;
pub mod registry;
pub mod reward;
pub mod rng;
pub mod state;
pub mod tick;

pub use entity::{EntityKind, SpawnKind, Spawnable, asteroid_radius, split_size};
pub use physics::{Body, BodyId, Layer, LayerMask, PhysicsWorld, RayHit, WallConstraint};
pub use registry::Registry;
pub use reward::{RewardBreakdown, RewardModel, position_factor};
pub use rng::{RandomSource, SimRng};
pub use state::{
    BodySnapshot, Cooldown, Episode, EpisodeSnapshot, EpisodeStats, EpisodeSummary,
    InvariantViolation, Ship, TerminationCause,
};
pub use tick::{TickOutcome, step, tick};
