//! Asteroid Agent - an Asteroids arena that doubles as an RL environment
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, entities, rewards, episode loop)
//! - `agent`: Observation/action contract and built-in policies
//! - `settings`: Tunable parameters and boundary/expiry policies
//! - `returns`: Leaderboard of best episode returns

pub mod agent;
pub mod error;
pub mod returns;
pub mod settings;
pub mod sim;

pub use error::AgentError;
pub use returns::ReturnBoard;
pub use settings::{AsteroidExpiry, BoundaryPolicy, Settings};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics step)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Slack when comparing accumulated simulation time against a duration
    pub const TIME_EPSILON: f32 = 1e-5;
    /// Squared length below which a sampled direction counts as degenerate
    pub const MIN_DIRECTION_LENGTH_SQ: f32 = 1e-8;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Forward (local "up") vector for a heading in degrees.
///
/// Heading 0 points along +Y; positive headings rotate counter-clockwise.
#[inline]
pub fn forward_from_heading(heading_deg: f32) -> Vec2 {
    let rad = heading_deg.to_radians();
    Vec2::new(-rad.sin(), rad.cos())
}

/// Rotate a vector counter-clockwise by `degrees`
#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Z component of the 3D cross product of two planar vectors
#[inline]
pub fn cross_z(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Infinity-norm distance from the origin (max of |x|, |y|)
#[inline]
pub fn chebyshev_length(p: Vec2) -> f32 {
    p.x.abs().max(p.y.abs())
}
