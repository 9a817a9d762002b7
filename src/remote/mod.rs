//! Remote coordination: operator commands, the controller and stream output.
//!
//! Transport failures are returned as [`RemoteError`] and treated by the
//! control loop as a no-op for that poll.

pub mod commands;
pub mod controller;
pub mod stream;

pub use commands::{Command, CommandKind, CommandStore};
pub use controller::{ControllerClient, HttpControllerClient};
pub use stream::{HttpStreamClient, StreamClient};

use std::time::Duration;
use thiserror::Error;

/// Request timeout for controller and stream calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Failed to build HTTP client: {source}")]
    Client { source: reqwest::Error },

    #[error("Request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}
