//! Built-in heuristic policy
//!
//! Reads raw control input straight through. With auto-aim enabled and no
//! manual turn held, it swings toward the nearest asteroid and fires
//! whenever the nose points at one.

use serde::{Deserialize, Serialize};

use super::action::{Action, Turn};
use super::policy::{DecisionContext, Policy};
use crate::cross_z;

/// Raw held-key state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    pub thrust: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl ControlInput {
    /// Manual turn, if exactly one turn key is held
    pub fn turn(&self) -> Option<Turn> {
        match (self.left, self.right) {
            (true, false) => Some(Turn::Left),
            (false, true) => Some(Turn::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicPolicy {
    pub input: ControlInput,
    pub auto_aim: bool,
}

impl HeuristicPolicy {
    /// Plain manual control
    pub fn manual() -> Self {
        Self::default()
    }

    /// Manual control with auto-aim filling in turning and firing
    pub fn auto_aim() -> Self {
        Self {
            input: ControlInput::default(),
            auto_aim: true,
        }
    }

    pub fn set_input(&mut self, input: ControlInput) {
        self.input = input;
    }
}

impl Policy for HeuristicPolicy {
    fn id(&self) -> &'static str {
        if self.auto_aim { "heuristic-auto-aim" } else { "heuristic" }
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
        let manual_turn = self.input.turn();
        let mut action = Action {
            move_forward: self.input.thrust,
            turn: manual_turn.unwrap_or(Turn::None),
            shoot: self.input.fire,
        };

        if self.auto_aim && manual_turn.is_none() {
            if let Some(target) = ctx.nearest_asteroid() {
                let to_target = target - ctx.ship_pos;
                action.turn = if cross_z(to_target, ctx.forward) < 0.0 {
                    Turn::Left
                } else {
                    Turn::Right
                };
            }
            if ctx.forward_ray_hits_asteroid() {
                action.shoot = true;
            }
        }

        action
    }
}
