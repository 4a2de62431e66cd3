//! Error types for the crate's fallible edges
//!
//! The simulation itself never fails; errors only arise when decoding actions
//! handed in from outside or when reading/writing files.

use std::fmt;

/// Why a discrete action vector could not be decoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionDecodeError {
    /// Wrong number of branches
    BranchCount { expected: usize, actual: usize },
    /// A branch value outside its range
    BranchValue { branch: usize, value: i32, max: i32 },
}

impl fmt::Display for ActionDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BranchCount { expected, actual } => {
                write!(f, "expected {expected} action branches, got {actual}")
            }
            Self::BranchValue { branch, value, max } => write!(
                f,
                "action branch {branch} value {value} out of range (allowed 0..={max})"
            ),
        }
    }
}

impl std::error::Error for ActionDecodeError {}

/// A settings value that would make the simulation meaningless
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsError {
    NonPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    SizeRange { min: f32, max: f32 },
    Exponent { value: u32 },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be > 0, got {value}")
            }
            Self::Negative { field, value } => write!(f, "{field} must be >= 0, got {value}"),
            Self::SizeRange { min, max } => {
                write!(f, "asteroid size range is empty: min {min} > max {max}")
            }
            Self::Exponent { value } => {
                write!(f, "position reward exponent must be 1 or 2, got {value}")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Top-level library error
#[derive(Debug)]
pub enum AgentError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Settings(SettingsError),
    Action(ActionDecodeError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Settings(err) => write!(f, "invalid settings: {err}"),
            Self::Action(err) => write!(f, "invalid action: {err}"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::Action(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<SettingsError> for AgentError {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

impl From<ActionDecodeError> for AgentError {
    fn from(err: ActionDecodeError) -> Self {
        Self::Action(err)
    }
}
