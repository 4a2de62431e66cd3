//! Discrete action decoding

use serde::{Deserialize, Serialize};

use crate::error::ActionDecodeError;

/// Turn intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Turn {
    #[default]
    None,
    /// Counter-clockwise (positive torque)
    Left,
    /// Clockwise (negative torque)
    Right,
}

impl Turn {
    /// Sign of the torque this intent applies
    pub fn sign(self) -> f32 {
        match self {
            Turn::None => 0.0,
            Turn::Left => 1.0,
            Turn::Right => -1.0,
        }
    }

    pub fn is_turning(self) -> bool {
        self != Turn::None
    }
}

/// One tick's worth of intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Action {
    pub move_forward: bool,
    pub turn: Turn,
    pub shoot: bool,
}

impl Action {
    /// Do nothing
    pub const IDLE: Action = Action {
        move_forward: false,
        turn: Turn::None,
        shoot: false,
    };

    /// Branch sizes of the discrete action space: move, turn, shoot
    pub const BRANCHES: [i32; 3] = [2, 3, 2];

    /// Decode `[move, turn, shoot]` where turn is 0 = none, 1 = left, 2 = right
    pub fn from_discrete(branches: &[i32]) -> Result<Self, ActionDecodeError> {
        if branches.len() != Self::BRANCHES.len() {
            return Err(ActionDecodeError::BranchCount {
                expected: Self::BRANCHES.len(),
                actual: branches.len(),
            });
        }
        for (branch, (&value, &size)) in branches.iter().zip(Self::BRANCHES.iter()).enumerate() {
            if !(0..size).contains(&value) {
                return Err(ActionDecodeError::BranchValue {
                    branch,
                    value,
                    max: size - 1,
                });
            }
        }

        let turn = match branches[1] {
            1 => Turn::Left,
            2 => Turn::Right,
            _ => Turn::None,
        };
        Ok(Action {
            move_forward: branches[0] == 1,
            turn,
            shoot: branches[2] == 1,
        })
    }

    pub fn to_discrete(&self) -> [i32; 3] {
        let turn = match self.turn {
            Turn::None => 0,
            Turn::Left => 1,
            Turn::Right => 2,
        };
        [self.move_forward as i32, turn, self.shoot as i32]
    }
}
