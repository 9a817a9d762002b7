//! Spectator session control: message taxonomy, per-iteration decisions and
//! the control loop that acts on them.

pub mod decision;
pub mod messages;
pub mod runner;

pub use runner::{ControlLoop, Remotes};
