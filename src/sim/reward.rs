//! Reward model
//!
//! One running scalar per episode, built from additive contributions:
//! staying near the centre, thrusting, turning, firing, and destroying
//! asteroids. Nothing is normalized or clipped except the centre term,
//! which floors at zero outside the level.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::chebyshev_length;
use crate::settings::RewardSettings;

/// Cumulative reward split by source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub position: f32,
    pub movement: f32,
    pub turning: f32,
    pub shooting: f32,
    pub destruction: f32,
}

impl RewardBreakdown {
    pub fn total(&self) -> f32 {
        self.position + self.movement + self.turning + self.shooting + self.destruction
    }
}

/// Centre-proximity factor: ((L - max(|x|,|y|)) / L)^p, floored at 0
pub fn position_factor(pos: Vec2, level_size: f32, exponent: u32) -> f32 {
    let base = ((level_size - chebyshev_length(pos)) / level_size).max(0.0);
    base.powi(exponent as i32)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardModel {
    settings: RewardSettings,
    cumulative: f32,
    breakdown: RewardBreakdown,
    /// Cumulative value at the last `take_delta` call
    reported: f32,
}

impl RewardModel {
    pub fn new(settings: RewardSettings) -> Self {
        Self {
            settings,
            cumulative: 0.0,
            breakdown: RewardBreakdown::default(),
            reported: 0.0,
        }
    }

    /// Zero everything at episode start
    pub fn reset(&mut self) {
        self.cumulative = 0.0;
        self.breakdown = RewardBreakdown::default();
        self.reported = 0.0;
    }

    pub fn cumulative(&self) -> f32 {
        self.cumulative
    }

    pub fn breakdown(&self) -> RewardBreakdown {
        self.breakdown
    }

    /// Reward accrued since the previous call
    pub fn take_delta(&mut self) -> f32 {
        let delta = self.cumulative - self.reported;
        self.reported = self.cumulative;
        delta
    }

    pub fn on_tick(&mut self, dt: f32, ship_pos: Vec2, level_size: f32) {
        let factor = position_factor(ship_pos, level_size, self.settings.position_exponent);
        let r = self.settings.position_scale * factor * dt;
        self.breakdown.position += r;
        self.cumulative += r;
    }

    pub fn on_move(&mut self, dt: f32) {
        let r = -self.settings.move_cost * dt;
        self.breakdown.movement += r;
        self.cumulative += r;
    }

    pub fn on_turn(&mut self, dt: f32) {
        let r = -self.settings.turn_cost * dt;
        self.breakdown.turning += r;
        self.cumulative += r;
    }

    pub fn on_shoot(&mut self) {
        let r = -self.settings.shoot_cost;
        self.breakdown.shooting += r;
        self.cumulative += r;
    }

    pub fn on_asteroid_destroyed(&mut self) {
        let r = self.settings.destroy_reward;
        self.breakdown.destruction += r;
        self.cumulative += r;
    }
}
