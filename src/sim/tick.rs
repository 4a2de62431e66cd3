//! Fixed timestep simulation tick
//!
//! Core episode loop that advances the simulation deterministically. One
//! tick runs, in order: distance sweep, boundary policy, spawn timer,
//! decision, action, per-tick rewards, then the physics step with its
//! collision events. An episode that ends during a tick is summarized and
//! reset before the tick returns.

use glam::Vec2;

use super::physics::{BodyId, Layer};
use super::state::{Episode, EpisodeSummary, TerminationCause};
use crate::agent::{Action, Observation, Policy};
use crate::chebyshev_length;
use crate::consts::TIME_EPSILON;
use crate::settings::BoundaryPolicy;

/// What one tick produced
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Reward accrued during this tick
    pub reward: f32,
    /// The action that was applied
    pub action: Action,
    /// Observation after the tick (of the fresh episode if one ended)
    pub observation: Observation,
    /// Set when the episode ended during this tick
    pub finished: Option<EpisodeSummary>,
}

impl TickOutcome {
    pub fn done(&self) -> bool {
        self.finished.is_some()
    }
}

/// Advance one tick, asking `policy` for the action
pub fn tick(episode: &mut Episode, policy: &mut dyn Policy, dt: f32) -> TickOutcome {
    let outcome = advance(episode, dt, |ep| policy.decide(&ep.decision_context()));
    if outcome.done() {
        policy.on_episode_begin(episode.episode_index);
    }
    outcome
}

/// Advance one tick with an action chosen outside the simulation
/// (e.g. by a learner that received the previous observation)
pub fn step(episode: &mut Episode, action: Action, dt: f32) -> TickOutcome {
    advance(episode, dt, |_| action)
}

fn advance<F>(episode: &mut Episode, dt: f32, decide: F) -> TickOutcome
where
    F: FnOnce(&Episode) -> Action,
{
    sweep_by_distance(episode);

    if let Some(cause) = apply_boundary(episode) {
        return end_tick(episode, Action::IDLE, Some(cause));
    }

    advance_spawner(episode, dt);

    let action = decide(episode);
    apply_action(episode, action, dt);
    accrue_tick_rewards(episode, action, dt);

    let mut cause = physics_step(episode, dt);

    episode.stats.ticks += 1;
    episode.total_ticks += 1;
    let limit = episode.settings.max_episode_ticks;
    if cause.is_none() && limit > 0 && episode.stats.ticks >= limit {
        cause = Some(TerminationCause::MaxTicks);
    }

    end_tick(episode, action, cause)
}

fn end_tick(episode: &mut Episode, action: Action, cause: Option<TerminationCause>) -> TickOutcome {
    let reward = episode.reward.take_delta();
    let finished = cause.map(|cause| episode.finish(cause));
    TickOutcome {
        reward,
        action,
        observation: episode.observe(),
        finished,
    }
}

/// Destroy distance-expiring entities that drifted past level_size + padding
fn sweep_by_distance(episode: &mut Episode) {
    let limit = episode.settings.sweep_distance();
    let stale: Vec<BodyId> = episode
        .registry
        .iter()
        .filter(|e| e.expires_by_distance())
        .filter(|e| {
            episode
                .world
                .get(e.body)
                .is_some_and(|b| chebyshev_length(b.pos) > limit)
        })
        .map(|e| e.body)
        .collect();

    for id in stale {
        if episode.destroy(id).is_some() {
            log::trace!("Asteroid {} swept out of play", id.0);
        }
    }
}

/// Enforce the boundary policy; returns a termination cause if the ship left
fn apply_boundary(episode: &mut Episode) -> Option<TerminationCause> {
    let level = episode.settings.level_size;
    match episode.settings.boundary {
        BoundaryPolicy::Clamp => {
            let ship = episode.ship.body;
            if let Some(body) = episode.world.get_mut(ship) {
                body.pos = body.pos.clamp(Vec2::splat(-level), Vec2::splat(level));
            }
            None
        }
        BoundaryPolicy::Terminate => {
            if chebyshev_length(episode.ship_pos()) > level {
                log::debug!("Ship left the level at {:?}", episode.ship_pos());
                Some(TerminationCause::OutOfBounds)
            } else {
                None
            }
        }
    }
}

fn advance_spawner(episode: &mut Episode, dt: f32) {
    episode.spawn_timer += dt;
    if episode.spawn_timer + TIME_EPSILON >= episode.settings.spawn_rate {
        let id = episode.spawn_random_asteroid();
        log::debug!(
            "Spawned asteroid {} ({} live)",
            id.0,
            episode.registry.len()
        );
        episode.spawn_timer = 0.0;
    }
}

fn apply_action(episode: &mut Episode, action: Action, dt: f32) {
    let ship = episode.ship.body;
    episode.ship.intent = action;
    episode.ship.cooldown.advance(dt);

    if action.move_forward {
        let force = episode.ship_forward() * episode.settings.move_speed;
        episode.world.apply_force(ship, force, dt);
    }

    if action.turn.is_turning() {
        let torque = action.turn.sign() * episode.settings.turn_speed;
        episode.world.apply_torque(ship, torque, dt);
    }

    if action.shoot && episode.ship.cooldown.can_shoot() {
        episode.spawn_bullet();
        episode.ship.cooldown.arm(episode.settings.shoot_cooldown);
        episode.reward.on_shoot();
        episode.stats.shots_fired += 1;
    }
}

fn accrue_tick_rewards(episode: &mut Episode, action: Action, dt: f32) {
    let pos = episode.ship_pos();
    episode.reward.on_tick(dt, pos, episode.settings.level_size);
    if action.move_forward {
        episode.reward.on_move(dt);
    }
    if action.turn.is_turning() {
        episode.reward.on_turn(dt);
    }
}

/// Integrate physics, resolve collision-enter events, then age lifetimes
fn physics_step(episode: &mut Episode, dt: f32) -> Option<TerminationCause> {
    let contacts = episode.world.step(dt);

    let mut cause = None;
    for (a, b) in contacts {
        if let Some(ended) = handle_contact(episode, a, b) {
            cause.get_or_insert(ended);
        }
    }

    let expired: Vec<BodyId> = episode
        .registry
        .iter_mut()
        .filter_map(|e| e.age(dt).then_some(e.body))
        .collect();
    for id in expired {
        episode.destroy(id);
    }

    cause
}

/// Resolve one collision-enter pair.
///
/// Either side may already have been destroyed earlier in the same step, in
/// which case the event is dropped.
fn handle_contact(episode: &mut Episode, a: BodyId, b: BodyId) -> Option<TerminationCause> {
    let layer_a = episode.world.get(a)?.layer;
    let layer_b = episode.world.get(b)?.layer;

    let (other, asteroid) = match (layer_a, layer_b) {
        (_, Layer::Asteroid) => (a, b),
        (Layer::Asteroid, _) => (b, a),
        _ => return None,
    };
    let other_layer = if other == a { layer_a } else { layer_b };

    match other_layer {
        Layer::Ship => {
            episode.destroy(asteroid);
            log::debug!("Ship hit by asteroid {}", asteroid.0);
            Some(TerminationCause::ShipDestroyed)
        }
        Layer::Bullet => {
            episode.destroy(other);
            let children = episode.split_asteroid(asteroid);
            episode.reward.on_asteroid_destroyed();
            episode.stats.asteroids_destroyed += 1;
            log::debug!(
                "Bullet {} destroyed asteroid {} ({} fragments)",
                other.0,
                asteroid.0,
                children.len()
            );
            None
        }
        Layer::Asteroid => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{HeuristicPolicy, Turn};
    use crate::consts::SIM_DT;
    use crate::settings::{AsteroidExpiry, Settings};
    use crate::sim::entity::EntityKind;
    use proptest::prelude::*;

    fn quiet_settings() -> Settings {
        // Spawner effectively off so tests control every asteroid
        Settings {
            spawn_rate: 1.0e6,
            max_episode_ticks: 0,
            ..Settings::default()
        }
    }

    fn fire() -> Action {
        Action {
            shoot: true,
            ..Action::IDLE
        }
    }

    #[test]
    fn test_reward_zero_after_reset_and_accumulates() {
        let mut episode = Episode::new(quiet_settings(), 5);
        assert_eq!(episode.cumulative_reward(), 0.0);

        let outcome = step(&mut episode, Action::IDLE, SIM_DT);
        // Centre of the level: full position reward
        let expected = 0.1 * SIM_DT;
        assert!((outcome.reward - expected).abs() < 1e-6);
        assert!((episode.cumulative_reward() - expected).abs() < 1e-6);

        episode.reset();
        assert_eq!(episode.cumulative_reward(), 0.0);
    }

    #[test]
    fn test_shoot_cost_once_per_bullet() {
        let mut episode = Episode::new(quiet_settings(), 5);
        step(&mut episode, fire(), SIM_DT);
        assert_eq!(episode.registry.count(EntityKind::Bullet), 1);
        assert_eq!(episode.stats.shots_fired, 1);
        assert!((episode.reward.breakdown().shooting + 0.05).abs() < 1e-6);

        // Cooldown blocks the next shot
        step(&mut episode, fire(), SIM_DT);
        assert_eq!(episode.stats.shots_fired, 1);
        assert!((episode.reward.breakdown().shooting + 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_cooldown_spans_duration() {
        let settings = Settings {
            shoot_cooldown: 0.25,
            ..quiet_settings()
        };
        let mut episode = Episode::new(settings, 5);
        let mut fired_at = Vec::new();
        for t in 0..40 {
            let before = episode.stats.shots_fired;
            step(&mut episode, fire(), SIM_DT);
            if episode.stats.shots_fired > before {
                fired_at.push(t);
            }
        }
        // 0.25 s at 50 Hz is 12.5 ticks, so the gun is ready again on tick 13
        assert_eq!(fired_at, vec![0, 13, 26, 39]);
    }

    #[test]
    fn test_move_and_turn_costs() {
        let mut episode = Episode::new(quiet_settings(), 5);
        let action = Action {
            move_forward: true,
            turn: Turn::Left,
            shoot: false,
        };
        step(&mut episode, action, SIM_DT);
        let b = episode.reward.breakdown();
        assert!((b.movement + 0.01 * SIM_DT).abs() < 1e-7);
        assert!((b.turning + 0.01 * SIM_DT).abs() < 1e-7);
        // Thrust moved the ship forward (+Y), left torque turned it CCW
        assert!(episode.ship_pos().y > 0.0);
        assert!(episode.ship_rotation() > 0.0);
    }

    #[test]
    fn test_bullet_destroys_asteroid_and_rewards_once() {
        let mut episode = Episode::new(quiet_settings(), 5);
        // Small asteroid straight ahead of the ship, not moving
        let rock = episode.spawn_asteroid(Vec2::new(0.0, 2.0), Vec2::ZERO, 0.5);

        let mut destroyed_at = None;
        for t in 0..60 {
            let action = if t == 0 { fire() } else { Action::IDLE };
            step(&mut episode, action, SIM_DT);
            if !episode.world.is_alive(rock) {
                destroyed_at = Some(t);
                break;
            }
        }
        assert!(destroyed_at.is_some());
        assert_eq!(episode.stats.asteroids_destroyed, 1);
        assert_eq!(episode.reward.breakdown().destruction, 1.0);
        // Too small to split, and the bullet is gone too
        assert!(episode.registry.is_empty());
        assert!(episode.check_invariants().is_ok());
    }

    #[test]
    fn test_bullet_splits_large_asteroid() {
        let mut episode = Episode::new(quiet_settings(), 5);
        episode.spawn_asteroid(Vec2::new(0.0, 2.5), Vec2::ZERO, 1.2);
        step(&mut episode, fire(), SIM_DT);
        for _ in 0..30 {
            step(&mut episode, Action::IDLE, SIM_DT);
        }
        assert_eq!(episode.stats.asteroids_split, 1);
        let sizes: Vec<_> = episode.registry.iter().filter_map(|e| e.size()).collect();
        assert_eq!(sizes, vec![0.6, 0.6]);
        assert!(episode.check_invariants().is_ok());
    }

    #[test]
    fn test_ship_collision_ends_episode() {
        let mut episode = Episode::new(quiet_settings(), 5);
        episode.spawn_asteroid(Vec2::new(0.6, 0.0), Vec2::ZERO, 1.0);
        episode.reward.on_asteroid_destroyed();

        let outcome = step(&mut episode, Action::IDLE, SIM_DT);
        let summary = outcome.finished.expect("episode should end");
        assert_eq!(summary.cause, TerminationCause::ShipDestroyed);
        assert_eq!(summary.episode, 0);
        assert!(summary.episode_return > 1.0);

        // Fresh episode: nothing carried over
        assert_eq!(episode.episode_index, 1);
        assert_eq!(episode.cumulative_reward(), 0.0);
        assert!(episode.registry.is_empty());
        assert_eq!(outcome.observation, Observation { x: 0.5, y: 0.5, heading: 0.0 });
    }

    #[test]
    fn test_clamp_policy_holds_ship_inside() {
        let mut episode = Episode::new(quiet_settings(), 5);
        let ship = episode.ship.body;
        episode.world.set_pose(ship, Vec2::new(4.9, 0.0), -90.0);
        episode.world.apply_impulse(ship, Vec2::new(50.0, 0.0));

        let thrust = Action {
            move_forward: true,
            ..Action::IDLE
        };
        for _ in 0..20 {
            let outcome = step(&mut episode, thrust, SIM_DT);
            assert!(!outcome.done());
            assert!(episode.ship_pos().x <= 5.0);
        }
    }

    #[test]
    fn test_terminate_policy_ends_episode_outside() {
        let settings = Settings {
            boundary: BoundaryPolicy::Terminate,
            ..quiet_settings()
        };
        let mut episode = Episode::new(settings, 5);
        let ship = episode.ship.body;
        episode.world.set_pose(ship, Vec2::new(4.9, 0.0), 0.0);
        episode.world.apply_impulse(ship, Vec2::new(20.0, 0.0));

        // First tick moves the ship past the edge; the next tick notices
        let first = step(&mut episode, Action::IDLE, SIM_DT);
        assert!(!first.done());
        assert!(episode.ship_pos().x > 5.0);
        let second = step(&mut episode, Action::IDLE, SIM_DT);
        assert_eq!(
            second.finished.map(|s| s.cause),
            Some(TerminationCause::OutOfBounds)
        );
        assert_eq!(episode.ship_pos(), Vec2::ZERO);
    }

    #[test]
    fn test_spawner_fires_on_schedule() {
        let settings = Settings {
            spawn_rate: 0.1,
            max_episode_ticks: 0,
            ..Settings::default()
        };
        let mut episode = Episode::new(settings, 9);
        for _ in 0..4 {
            step(&mut episode, Action::IDLE, SIM_DT);
        }
        assert_eq!(episode.stats.asteroids_spawned, 0);
        step(&mut episode, Action::IDLE, SIM_DT);
        assert_eq!(episode.stats.asteroids_spawned, 1);
        assert_eq!(episode.spawn_timer, 0.0);

        let spawned = episode.registry.iter().next().copied().unwrap();
        let body = episode.world.get(spawned.body).unwrap();
        // Spawned on the ring, then moved one physics step inward
        assert!((body.pos.length() - 20.0).abs() < 0.1);
        assert!(body.vel.dot(body.pos) < 0.0);
    }

    #[test]
    fn test_distance_sweep_removes_escapees() {
        let mut episode = Episode::new(quiet_settings(), 5);
        let rock = episode.spawn_asteroid(Vec2::new(19.99, 0.0), Vec2::new(5.0, 0.0), 0.5);
        step(&mut episode, Action::IDLE, SIM_DT);
        // Moved past 20 during the physics step; swept at the start of the next tick
        assert!(episode.world.is_alive(rock));
        step(&mut episode, Action::IDLE, SIM_DT);
        assert!(!episode.world.is_alive(rock));
        assert!(episode.registry.is_empty());
        assert!(episode.check_invariants().is_ok());
    }

    #[test]
    fn test_lifetime_expiry() {
        let settings = Settings {
            asteroid_expiry: AsteroidExpiry::Lifetime { seconds: 0.1 },
            ..quiet_settings()
        };
        let mut episode = Episode::new(settings, 5);
        // Far outside the sweep distance: only the timer can remove it
        let rock = episode.spawn_asteroid(Vec2::new(100.0, 0.0), Vec2::ZERO, 1.0);
        for _ in 0..4 {
            step(&mut episode, Action::IDLE, SIM_DT);
        }
        assert!(episode.world.is_alive(rock));
        step(&mut episode, Action::IDLE, SIM_DT);
        assert!(!episode.world.is_alive(rock));
    }

    #[test]
    fn test_bullet_lifetime() {
        let settings = Settings {
            bullet_lifetime: 0.1,
            ..quiet_settings()
        };
        let mut episode = Episode::new(settings, 5);
        step(&mut episode, fire(), SIM_DT);
        assert_eq!(episode.registry.count(EntityKind::Bullet), 1);
        for _ in 0..5 {
            step(&mut episode, Action::IDLE, SIM_DT);
        }
        assert_eq!(episode.registry.count(EntityKind::Bullet), 0);
    }

    #[test]
    fn test_max_ticks_truncates() {
        let settings = Settings {
            max_episode_ticks: 10,
            ..quiet_settings()
        };
        let mut episode = Episode::new(settings, 5);
        for _ in 0..9 {
            assert!(!step(&mut episode, Action::IDLE, SIM_DT).done());
        }
        let outcome = step(&mut episode, Action::IDLE, SIM_DT);
        let summary = outcome.finished.unwrap();
        assert_eq!(summary.cause, TerminationCause::MaxTicks);
        assert!(summary.cause.is_truncation());
        assert_eq!(summary.stats.ticks, 10);
    }

    #[test]
    fn test_determinism() {
        // Two episodes with the same seed and policy stay identical
        let settings = Settings {
            spawn_rate: 0.2,
            ..Settings::default()
        };
        let mut ep1 = Episode::new(settings.clone(), 424242);
        let mut ep2 = Episode::new(settings, 424242);
        let mut p1 = HeuristicPolicy::auto_aim();
        let mut p2 = HeuristicPolicy::auto_aim();

        for _ in 0..500 {
            let o1 = tick(&mut ep1, &mut p1, SIM_DT);
            let o2 = tick(&mut ep2, &mut p2, SIM_DT);
            assert_eq!(o1.action, o2.action);
            assert_eq!(o1.reward, o2.reward);
        }
        assert_eq!(ep1.snapshot(), ep2.snapshot());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_registry_matches_world(
            seed in any::<u64>(),
            terminate in any::<bool>(),
            lifetime in proptest::option::of(0.1f32..1.0),
            actions in proptest::collection::vec(0u8..12, 50..200),
        ) {
            let settings = Settings {
                spawn_rate: 0.1,
                padding: 3.0,
                max_episode_ticks: 60,
                boundary: if terminate { BoundaryPolicy::Terminate } else { BoundaryPolicy::Clamp },
                asteroid_expiry: match lifetime {
                    Some(seconds) => AsteroidExpiry::Lifetime { seconds },
                    None => AsteroidExpiry::Distance,
                },
                ..Settings::default()
            };
            let mut episode = Episode::new(settings, seed);
            for bits in actions {
                let action = Action {
                    move_forward: bits & 1 != 0,
                    turn: match (bits >> 1) % 3 {
                        1 => Turn::Left,
                        2 => Turn::Right,
                        _ => Turn::None,
                    },
                    shoot: bits >= 6,
                };
                let outcome = step(&mut episode, action, SIM_DT);
                prop_assert!(episode.check_invariants().is_ok());
                if outcome.done() {
                    prop_assert!(episode.registry.is_empty());
                    prop_assert_eq!(episode.cumulative_reward(), 0.0);
                    prop_assert_eq!(episode.ship_pos(), Vec2::ZERO);
                }
                if !terminate {
                    prop_assert!(chebyshev_length(episode.ship_pos()) <= episode.settings.level_size);
                }
            }
        }
    }
}
