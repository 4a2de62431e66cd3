//! Episode state and core simulation types
//!
//! Everything an episode owns lives here: the physics world, the ship and
//! its weapon cooldown, the entity registry, the spawn timer and the reward
//! model. Spawning and destruction go through [`Episode`] so the registry
//! and the physics world never disagree.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, SpawnKind, Spawnable, asteroid_radius, split_size};
use super::physics::{Body, BodyId, Layer, PhysicsWorld, WallConstraint};
use super::registry::Registry;
use super::reward::{RewardBreakdown, RewardModel};
use super::rng::{RandomSource, SimRng};
use crate::agent::{Action, DecisionContext, Observation, observe};
use crate::consts::TIME_EPSILON;
use crate::error::SettingsError;
use crate::settings::{AsteroidExpiry, BoundaryPolicy, Settings};
use crate::{forward_from_heading, rotate_degrees};

/// Weapon cooldown as a countdown in simulation seconds.
///
/// Arming always restarts the countdown from the full duration; there is
/// only ever one pending re-enable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    can_shoot: bool,
    remaining: f32,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self {
            can_shoot: true,
            remaining: 0.0,
        }
    }
}

impl Cooldown {
    pub fn can_shoot(&self) -> bool {
        self.can_shoot
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Disable shooting for `duration` seconds
    pub fn arm(&mut self, duration: f32) {
        self.can_shoot = false;
        self.remaining = duration;
    }

    /// Count down; re-enables shooting once the duration has elapsed
    pub fn advance(&mut self, dt: f32) {
        if self.can_shoot {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= TIME_EPSILON {
            self.remaining = 0.0;
            self.can_shoot = true;
        }
    }

    /// Cancel any pending re-enable
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub body: BodyId,
    /// Intents applied on the most recent tick
    pub intent: Action,
    pub cooldown: Cooldown,
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// An asteroid hit the ship
    ShipDestroyed,
    /// The ship left the level (terminate boundary policy)
    OutOfBounds,
    /// The episode reached its tick limit
    MaxTicks,
}

impl TerminationCause {
    /// True for time-limit truncation rather than a terminal state
    pub fn is_truncation(self) -> bool {
        self == TerminationCause::MaxTicks
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShipDestroyed => write!(f, "ship destroyed"),
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::MaxTicks => write!(f, "tick limit"),
        }
    }
}

/// Per-episode counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub ticks: u64,
    pub asteroids_spawned: u32,
    pub asteroids_destroyed: u32,
    pub asteroids_split: u32,
    pub shots_fired: u32,
}

/// Final report of a finished episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: u64,
    pub episode_return: f32,
    pub cause: TerminationCause,
    pub stats: EpisodeStats,
    pub breakdown: RewardBreakdown,
}

/// Registry/physics bookkeeping fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    ShipMissing,
    /// Registered entity with no live body
    Dangling(BodyId),
    /// Live spawnable body that is not registered
    Leaked(BodyId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShipMissing => write!(f, "ship body missing"),
            Self::Dangling(id) => write!(f, "registered body {} is not alive", id.0),
            Self::Leaked(id) => write!(f, "live body {} is not registered", id.0),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Serializable view of a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub size: Option<f32>,
}

/// Serializable view of the whole episode (for displays and replays)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub episode: u64,
    pub tick: u64,
    pub ship: BodySnapshot,
    pub can_shoot: bool,
    pub cooldown_remaining: f32,
    pub spawn_timer: f32,
    pub reward: f32,
    pub asteroids: Vec<BodySnapshot>,
    pub bullets: Vec<BodySnapshot>,
}

/// One episode of play, reused across resets
pub struct Episode {
    pub settings: Settings,
    pub world: PhysicsWorld,
    pub registry: Registry,
    pub ship: Ship,
    pub reward: RewardModel,
    /// Seconds since the last asteroid spawn
    pub spawn_timer: f32,
    /// Index of the current episode (first episode is 0)
    pub episode_index: u64,
    /// Ticks across all episodes
    pub total_ticks: u64,
    pub stats: EpisodeStats,
    rng: Box<dyn RandomSource>,
}

impl Episode {
    /// Validate the settings, then create an episode
    pub fn try_new(settings: Settings, seed: u64) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::new(settings, seed))
    }

    /// Create an episode driven by a seeded PCG stream.
    ///
    /// Settings are taken as given; callers holding untrusted settings
    /// should go through [`Episode::try_new`] (a zero level size, for
    /// example, makes every observation non-finite).
    pub fn new(settings: Settings, seed: u64) -> Self {
        log::info!(
            "New episode controller (seed {}, boundary {})",
            seed,
            settings.boundary.as_str()
        );
        Self::with_rng(settings, Box::new(SimRng::new(seed)))
    }

    /// Create an episode with a custom random source
    pub fn with_rng(settings: Settings, rng: Box<dyn RandomSource>) -> Self {
        if let Err(err) = settings.validate() {
            log::warn!("Episode built with invalid settings: {}", err);
        }
        let mut world = PhysicsWorld::new();
        let wall = match settings.boundary {
            BoundaryPolicy::Clamp => Some(WallConstraint {
                half_size: settings.level_size,
            }),
            BoundaryPolicy::Terminate => None,
        };
        let ship_body = Body::new(Layer::Ship, Vec2::ZERO, 0.0, settings.ship_radius)
            .with_drag(settings.ship_linear_drag, settings.ship_angular_drag)
            .with_wall(wall);
        let ship = Ship {
            body: world.spawn(ship_body),
            intent: Action::IDLE,
            cooldown: Cooldown::default(),
        };

        Self {
            reward: RewardModel::new(settings.rewards.clone()),
            settings,
            world,
            registry: Registry::new(),
            ship,
            spawn_timer: 0.0,
            episode_index: 0,
            total_ticks: 0,
            stats: EpisodeStats::default(),
            rng,
        }
    }

    /// Start a fresh episode: clear all spawned entities, put the ship back
    /// at rest at the origin, zero timers, cooldown and reward.
    pub fn reset(&mut self) {
        for entity in self.registry.drain() {
            self.world.despawn(entity.body);
        }
        self.world.set_pose(self.ship.body, Vec2::ZERO, 0.0);
        self.world.stop(self.ship.body);
        self.ship.intent = Action::IDLE;
        self.ship.cooldown.clear();
        self.spawn_timer = 0.0;
        self.reward.reset();
        self.stats = EpisodeStats::default();
        self.episode_index += 1;
        log::debug!("Episode {} begins", self.episode_index);
    }

    pub fn ship_body(&self) -> &Body {
        // The ship body is spawned once and never despawned
        self.world
            .get(self.ship.body)
            .unwrap_or_else(|| unreachable!("ship body missing"))
    }

    pub fn ship_pos(&self) -> Vec2 {
        self.ship_body().pos
    }

    pub fn ship_rotation(&self) -> f32 {
        self.ship_body().rotation
    }

    /// Unit vector the ship faces
    pub fn ship_forward(&self) -> Vec2 {
        forward_from_heading(self.ship_rotation())
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.reward.cumulative()
    }

    pub fn observe(&self) -> Observation {
        let body = self.ship_body();
        observe(body.pos, body.rotation, self.settings.level_size)
    }

    pub fn decision_context(&self) -> DecisionContext<'_> {
        let body = self.ship_body();
        DecisionContext::new(
            self.observe(),
            body.pos,
            body.rotation,
            &self.world,
            &self.registry,
        )
    }

    /// Spawn an asteroid with a one-time impulse
    pub fn spawn_asteroid(&mut self, pos: Vec2, velocity: Vec2, size: f32) -> BodyId {
        let rotation = heading_of(velocity);
        let id = self
            .world
            .spawn(Body::new(Layer::Asteroid, pos, rotation, asteroid_radius(size)));
        self.world.apply_impulse(id, velocity);

        let lifetime = match self.settings.asteroid_expiry {
            AsteroidExpiry::Distance => None,
            AsteroidExpiry::Lifetime { seconds } => Some(seconds),
        };
        self.registry.register(Spawnable::asteroid(id, size, lifetime));
        self.stats.asteroids_spawned += 1;
        log::trace!("Asteroid {} spawned at {:?} size {:.2}", id.0, pos, size);
        id
    }

    /// Spawn an asteroid at the edge of the spawn ring, aimed roughly at the centre
    pub fn spawn_random_asteroid(&mut self) -> BodyId {
        let dir = self.rng.unit_direction();
        let pos = dir * self.settings.sweep_distance();
        let angle = self.settings.trajectory_angle;
        let offset = self.rng.range(-angle, angle);
        let travel = rotate_degrees(-dir, offset);
        let size = self
            .rng
            .range(self.settings.asteroid_min_size, self.settings.asteroid_max_size);
        self.spawn_asteroid(pos, travel * self.settings.asteroid_speed, size)
    }

    /// Fire a bullet from the ship's nose
    pub fn spawn_bullet(&mut self) -> BodyId {
        let ship = self.ship_body();
        let (pos, rotation) = (ship.pos, ship.rotation);
        let id = self.world.spawn(Body::new(
            Layer::Bullet,
            pos,
            rotation,
            self.settings.bullet_radius,
        ));
        self.world
            .apply_impulse(id, forward_from_heading(rotation) * self.settings.bullet_speed);
        self.registry
            .register(Spawnable::bullet(id, self.settings.bullet_lifetime));
        id
    }

    /// Destroy a spawned entity.
    ///
    /// Removes it from both the registry and the physics world. Returns the
    /// registry entry the first time; any later call for the same body is a
    /// no-op returning None. The ship is never destroyed this way.
    pub fn destroy(&mut self, body: BodyId) -> Option<Spawnable> {
        if body == self.ship.body {
            return None;
        }
        let entry = self.registry.deregister(body);
        self.world.despawn(body);
        entry
    }

    /// Destroy an asteroid and spawn its children if it is big enough.
    ///
    /// Returns the ids of the children (empty when the asteroid was too
    /// small to split, or had already been destroyed).
    pub fn split_asteroid(&mut self, body: BodyId) -> Vec<BodyId> {
        let Some(parent) = self.world.get(body).cloned() else {
            return Vec::new();
        };
        let Some(entry) = self.destroy(body) else {
            return Vec::new();
        };
        let SpawnKind::Asteroid { size, .. } = entry.kind else {
            return Vec::new();
        };
        let Some(child_size) = split_size(size, self.settings.asteroid_min_size) else {
            log::trace!("Asteroid {} too small to split", body.0);
            return Vec::new();
        };

        let half_spread = self.settings.split_spread * 0.5;
        let side = parent
            .vel
            .try_normalize()
            .unwrap_or_else(|| forward_from_heading(parent.rotation))
            .perp();
        let offset = side * asteroid_radius(child_size);

        self.stats.asteroids_split += 1;
        vec![
            self.spawn_asteroid(
                parent.pos + offset,
                rotate_degrees(parent.vel, half_spread),
                child_size,
            ),
            self.spawn_asteroid(
                parent.pos - offset,
                rotate_degrees(parent.vel, -half_spread),
                child_size,
            ),
        ]
    }

    /// Check that registry and physics world agree
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if !self.world.is_alive(self.ship.body) {
            return Err(InvariantViolation::ShipMissing);
        }
        for entry in self.registry.iter() {
            if !self.world.is_alive(entry.body) {
                return Err(InvariantViolation::Dangling(entry.body));
            }
        }
        for body in self.world.bodies() {
            if body.id != self.ship.body && !self.registry.contains(body.id) {
                return Err(InvariantViolation::Leaked(body.id));
            }
        }
        Ok(())
    }

    /// Capture the current state for display or logging
    pub fn snapshot(&self) -> EpisodeSnapshot {
        let snap = |id: BodyId, size: Option<f32>| {
            self.world.get(id).map(|b| BodySnapshot {
                id: b.id.0,
                pos: b.pos,
                vel: b.vel,
                rotation: b.rotation,
                size,
            })
        };
        let of_kind = |kind: EntityKind| {
            self.registry
                .iter()
                .filter(|e| e.entity_kind() == kind)
                .filter_map(|e| snap(e.body, e.size()))
                .collect::<Vec<_>>()
        };

        let ship = self.ship_body();
        EpisodeSnapshot {
            episode: self.episode_index,
            tick: self.stats.ticks,
            ship: BodySnapshot {
                id: ship.id.0,
                pos: ship.pos,
                vel: ship.vel,
                rotation: ship.rotation,
                size: None,
            },
            can_shoot: self.ship.cooldown.can_shoot(),
            cooldown_remaining: self.ship.cooldown.remaining(),
            spawn_timer: self.spawn_timer,
            reward: self.reward.cumulative(),
            asteroids: of_kind(EntityKind::Asteroid),
            bullets: of_kind(EntityKind::Bullet),
        }
    }

    /// Wrap up the current episode and start the next one
    pub(crate) fn finish(&mut self, cause: TerminationCause) -> EpisodeSummary {
        let summary = EpisodeSummary {
            episode: self.episode_index,
            episode_return: self.reward.cumulative(),
            cause,
            stats: self.stats,
            breakdown: self.reward.breakdown(),
        };
        log::info!(
            "Episode {} ended ({}) after {} ticks: return {:.3}, {} asteroids destroyed",
            summary.episode,
            cause,
            summary.stats.ticks,
            summary.episode_return,
            summary.stats.asteroids_destroyed
        );
        self.reset();
        summary
    }
}

/// Heading (degrees) whose forward vector points along `v`
fn heading_of(v: Vec2) -> f32 {
    if v.length_squared() == 0.0 {
        return 0.0;
    }
    (-v.x).atan2(v.y).to_degrees()
}
