//! Game-facing layer: session state, reported phases and the instance manager.

pub mod constants;
pub mod manager;
pub mod phase;
pub mod state;
