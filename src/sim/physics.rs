//! Minimal rigid-body world
//!
//! Stands in for the host engine's 2D physics: bodies with pose and velocity,
//! one-shot impulses, forces and torques, damping, an optional axis-aligned
//! wall constraint, collision-enter events between circles, and ray casts
//! filtered by layer mask. Bodies are kept sorted by id so every pass over
//! the world is deterministic.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable body handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Collision layer of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Ship,
    Asteroid,
    Bullet,
}

impl Layer {
    fn bit(self) -> u8 {
        match self {
            Layer::Ship => 1 << 0,
            Layer::Asteroid => 1 << 1,
            Layer::Bullet => 1 << 2,
        }
    }

    /// Layer collision matrix: asteroids hit ships and bullets, nothing else
    /// interacts.
    pub fn collides_with(self, other: Layer) -> bool {
        matches!(
            (self, other),
            (Layer::Ship, Layer::Asteroid)
                | (Layer::Asteroid, Layer::Ship)
                | (Layer::Bullet, Layer::Asteroid)
                | (Layer::Asteroid, Layer::Bullet)
        )
    }
}

/// Set of layers for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(0b111);

    pub fn of(layer: Layer) -> Self {
        LayerMask(layer.bit())
    }

    pub fn with(self, layer: Layer) -> Self {
        LayerMask(self.0 | layer.bit())
    }

    pub fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }
}

/// Square wall a body cannot leave (centred on the origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallConstraint {
    pub half_size: f32,
}

impl WallConstraint {
    /// Clamp a position into the square; returns true if it had to move
    pub fn clamp(&self, pos: &mut Vec2) -> bool {
        let clamped = pos.clamp(Vec2::splat(-self.half_size), Vec2::splat(self.half_size));
        let moved = clamped != *pos;
        *pos = clamped;
        moved
    }
}

/// A rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub layer: Layer,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Heading in degrees (unbounded)
    pub rotation: f32,
    /// Degrees per second
    pub angular_vel: f32,
    pub radius: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub wall: Option<WallConstraint>,
}

impl Body {
    pub fn new(layer: Layer, pos: Vec2, rotation: f32, radius: f32) -> Self {
        Self {
            id: BodyId(0),
            layer,
            pos,
            vel: Vec2::ZERO,
            rotation,
            angular_vel: 0.0,
            radius,
            linear_drag: 0.0,
            angular_drag: 0.0,
            wall: None,
        }
    }

    pub fn with_drag(mut self, linear: f32, angular: f32) -> Self {
        self.linear_drag = linear;
        self.angular_drag = angular;
        self
    }

    pub fn with_wall(mut self, wall: Option<WallConstraint>) -> Self {
        self.wall = wall;
        self
    }

    /// Advance pose by dt (semi-implicit Euler with linear damping)
    fn integrate(&mut self, dt: f32) {
        if self.linear_drag > 0.0 {
            self.vel *= 1.0 / (1.0 + dt * self.linear_drag);
        }
        if self.angular_drag > 0.0 {
            self.angular_vel *= 1.0 / (1.0 + dt * self.angular_drag);
        }

        self.pos += self.vel * dt;
        self.rotation += self.angular_vel * dt;

        if let Some(wall) = self.wall {
            let before = self.pos;
            if wall.clamp(&mut self.pos) {
                // Kill the velocity component that pushed into the wall
                if before.x != self.pos.x {
                    self.vel.x = 0.0;
                }
                if before.y != self.pos.y {
                    self.vel.y = 0.0;
                }
            }
        }
    }
}

/// Result of a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    pub distance: f32,
    pub point: Vec2,
}

/// Distance along a ray to a circle, if it is hit at t >= 0
pub fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let c = to_center.length_squared() - radius * radius;
    if c <= 0.0 {
        // Origin inside the circle
        return Some(0.0);
    }
    let b = to_center.dot(dir);
    if b <= 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(b - disc.sqrt())
}

/// The physics world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsWorld {
    /// Live bodies (sorted by id)
    bodies: Vec<Body>,
    /// Pairs overlapping at the end of the previous step
    #[serde(skip)]
    touching: BTreeSet<(BodyId, BodyId)>,
    next_id: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            touching: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Add a body and return its handle
    pub fn spawn(&mut self, mut body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.id = id;
        self.bodies.push(body);
        id
    }

    /// Remove a body. Removing an already-removed body is a no-op.
    pub fn despawn(&mut self, id: BodyId) -> Option<Body> {
        let idx = self.index_of(id)?;
        self.touching.retain(|&(a, b)| a != id && b != id);
        Some(self.bodies.remove(idx))
    }

    pub fn is_alive(&self, id: BodyId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index_of(id).map(move |i| &mut self.bodies[i])
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    /// One-shot velocity change (unit mass)
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) {
        if let Some(body) = self.get_mut(id) {
            body.vel += impulse;
        }
    }

    /// Continuous force applied over dt
    pub fn apply_force(&mut self, id: BodyId, force: Vec2, dt: f32) {
        self.apply_impulse(id, force * dt);
    }

    /// Torque applied over dt (degrees/s² with unit inertia)
    pub fn apply_torque(&mut self, id: BodyId, torque: f32, dt: f32) {
        if let Some(body) = self.get_mut(id) {
            body.angular_vel += torque * dt;
        }
    }

    /// Force a body's pose
    pub fn set_pose(&mut self, id: BodyId, pos: Vec2, rotation: f32) {
        if let Some(body) = self.get_mut(id) {
            body.pos = pos;
            body.rotation = rotation;
        }
    }

    /// Zero a body's linear and angular velocity
    pub fn stop(&mut self, id: BodyId) {
        if let Some(body) = self.get_mut(id) {
            body.vel = Vec2::ZERO;
            body.angular_vel = 0.0;
        }
    }

    /// Integrate every body by dt and return collision-enter pairs.
    ///
    /// A pair is reported only on the step it starts overlapping; pairs are
    /// ordered by (lower id, higher id).
    pub fn step(&mut self, dt: f32) -> Vec<(BodyId, BodyId)> {
        for body in &mut self.bodies {
            body.integrate(dt);
        }

        let mut now_touching = BTreeSet::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                if !a.layer.collides_with(b.layer) {
                    continue;
                }
                let reach = a.radius + b.radius;
                if a.pos.distance_squared(b.pos) <= reach * reach {
                    now_touching.insert((a.id, b.id));
                }
            }
        }

        let entered: Vec<_> = now_touching
            .iter()
            .filter(|pair| !self.touching.contains(pair))
            .copied()
            .collect();
        self.touching = now_touching;
        entered
    }

    /// Nearest body on a masked layer hit by a ray within max_distance
    pub fn raycast(
        &self,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let dir = dir.try_normalize()?;
        self.bodies
            .iter()
            .filter(|b| mask.contains(b.layer))
            .filter_map(|b| {
                ray_circle(origin, dir, b.pos, b.radius)
                    .filter(|&t| t <= max_distance)
                    .map(|t| (b.id, t))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(body, distance)| RayHit {
                body,
                distance,
                point: origin + dir * distance,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_despawn_idempotent() {
        let mut world = PhysicsWorld::new();
        let a = world.spawn(Body::new(Layer::Asteroid, Vec2::ZERO, 0.0, 1.0));
        assert!(world.is_alive(a));
        assert!(world.despawn(a).is_some());
        assert!(world.despawn(a).is_none());
        assert!(!world.is_alive(a));
    }

    #[test]
    fn test_impulse_then_step_moves_body() {
        let mut world = PhysicsWorld::new();
        let id = world.spawn(Body::new(Layer::Asteroid, Vec2::ZERO, 0.0, 0.5));
        world.apply_impulse(id, Vec2::new(2.0, 0.0));
        world.step(0.5);
        let body = world.get(id).unwrap();
        assert!((body.pos - Vec2::new(1.0, 0.0)).length() < 1e-6);
        // No drag: velocity persists
        assert!((body.vel.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_drag_slows_body() {
        let mut world = PhysicsWorld::new();
        let id = world.spawn(Body::new(Layer::Ship, Vec2::ZERO, 0.0, 0.5).with_drag(1.0, 1.0));
        world.apply_impulse(id, Vec2::X);
        world.apply_torque(id, 100.0, 1.0);
        world.step(0.1);
        let body = world.get(id).unwrap();
        assert!(body.vel.x < 1.0);
        assert!(body.angular_vel < 100.0);
    }

    #[test]
    fn test_wall_constraint_holds_position() {
        let mut world = PhysicsWorld::new();
        let wall = Some(WallConstraint { half_size: 5.0 });
        let id = world.spawn(Body::new(Layer::Ship, Vec2::new(4.9, 0.0), 0.0, 0.25).with_wall(wall));
        world.apply_impulse(id, Vec2::new(100.0, 0.0));
        world.step(0.02);
        let body = world.get(id).unwrap();
        assert!(body.pos.x <= 5.0);
        assert_eq!(body.vel.x, 0.0);
    }

    #[test]
    fn test_collision_enter_reported_once() {
        let mut world = PhysicsWorld::new();
        let ship = world.spawn(Body::new(Layer::Ship, Vec2::ZERO, 0.0, 0.5));
        let rock = world.spawn(Body::new(Layer::Asteroid, Vec2::new(0.8, 0.0), 0.0, 0.5));
        assert_eq!(world.step(0.02), vec![(ship, rock)]);
        // Still overlapping: no new enter event
        assert!(world.step(0.02).is_empty());
    }

    #[test]
    fn test_layer_matrix_filters_pairs() {
        let mut world = PhysicsWorld::new();
        world.spawn(Body::new(Layer::Asteroid, Vec2::ZERO, 0.0, 0.5));
        world.spawn(Body::new(Layer::Asteroid, Vec2::new(0.1, 0.0), 0.0, 0.5));
        world.spawn(Body::new(Layer::Ship, Vec2::new(10.0, 0.0), 0.0, 0.5));
        world.spawn(Body::new(Layer::Bullet, Vec2::new(10.0, 0.0), 0.0, 0.5));
        assert!(world.step(0.02).is_empty());
    }

    #[test]
    fn test_raycast_hits_nearest_on_mask() {
        let mut world = PhysicsWorld::new();
        let far = world.spawn(Body::new(Layer::Asteroid, Vec2::new(0.0, 10.0), 0.0, 1.0));
        let near = world.spawn(Body::new(Layer::Asteroid, Vec2::new(0.0, 5.0), 0.0, 1.0));
        let bullet = world.spawn(Body::new(Layer::Bullet, Vec2::new(0.0, 2.0), 0.0, 0.5));

        let hit = world
            .raycast(Vec2::ZERO, Vec2::Y, f32::INFINITY, LayerMask::of(Layer::Asteroid))
            .unwrap();
        assert_eq!(hit.body, near);
        assert!((hit.distance - 4.0).abs() < 1e-5);

        let mask = LayerMask::of(Layer::Asteroid).with(Layer::Bullet);
        let hit = world.raycast(Vec2::ZERO, Vec2::Y, f32::INFINITY, mask).unwrap();
        assert_eq!(hit.body, bullet);
        assert!((hit.point - Vec2::new(0.0, 1.5)).length() < 1e-5);

        // Limited range misses both
        assert!(world
            .raycast(Vec2::ZERO, Vec2::Y, 3.0, LayerMask::of(Layer::Asteroid))
            .is_none());
        // Pointing away misses
        assert!(world
            .raycast(Vec2::ZERO, Vec2::NEG_Y, f32::INFINITY, LayerMask::ALL)
            .is_none());
        assert_ne!(far, near);
    }

    #[test]
    fn test_ray_circle_inside_origin() {
        assert_eq!(ray_circle(Vec2::ZERO, Vec2::X, Vec2::ZERO, 1.0), Some(0.0));
    }
}
