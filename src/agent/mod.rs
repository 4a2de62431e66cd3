//! Decision interface
//!
//! The contract between the simulation and whoever drives the ship: a
//! normalized [`Observation`] goes out, a discrete [`Action`] comes back.
//! The driver is any [`Policy`]: the built-in [`HeuristicPolicy`] (manual
//! controls with optional auto-aim) or an external learned model wrapped in
//! [`FnPolicy`].

pub mod action;
pub mod heuristic;
pub mod observation;
pub mod policy;

pub use action::{Action, Turn};
pub use heuristic::{ControlInput, HeuristicPolicy};
pub use observation::{Observation, observe};
pub use policy::{DecisionContext, FnPolicy, Policy};
