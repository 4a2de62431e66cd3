//! Observation encoding

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::wrap_degrees;

/// Normalized ship state handed to the policy.
///
/// Positions map [-level_size, level_size] onto [0, 1]; heading maps
/// [0°, 360°) onto [0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

impl Observation {
    /// Length of the flat observation vector
    pub const SIZE: usize = 3;

    pub fn to_array(&self) -> [f32; Self::SIZE] {
        [self.x, self.y, self.heading]
    }
}

/// Encode a ship pose
pub fn observe(pos: Vec2, rotation_deg: f32, level_size: f32) -> Observation {
    Observation {
        x: (pos.x / level_size + 1.0) / 2.0,
        y: (pos.y / level_size + 1.0) / 2.0,
        heading: wrap_degrees(rotation_deg) / 360.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_centre() {
        let obs = observe(Vec2::ZERO, 0.0, 5.0);
        assert_eq!(obs, Observation { x: 0.5, y: 0.5, heading: 0.0 });
    }

    #[test]
    fn test_level_edges_map_to_unit_range() {
        let lo = observe(Vec2::new(-5.0, -5.0), 0.0, 5.0);
        let hi = observe(Vec2::new(5.0, 5.0), 0.0, 5.0);
        assert_eq!((lo.x, lo.y), (0.0, 0.0));
        assert_eq!((hi.x, hi.y), (1.0, 1.0));
    }

    #[test]
    fn test_heading_wraps() {
        assert!((observe(Vec2::ZERO, 450.0, 5.0).heading - 0.25).abs() < 1e-6);
        assert!((observe(Vec2::ZERO, -90.0, 5.0).heading - 0.75).abs() < 1e-6);
        let full = observe(Vec2::ZERO, 360.0, 5.0).heading;
        assert!((0.0..1.0).contains(&full));
    }

    #[test]
    fn test_to_array_order() {
        let obs = observe(Vec2::new(2.5, 0.0), 180.0, 5.0);
        assert_eq!(obs.to_array(), [0.75, 0.5, 0.5]);
    }
}
