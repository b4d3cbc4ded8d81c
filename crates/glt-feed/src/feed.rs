//! Feed trait and error taxonomy.
//!
//! This module defines **only** the fetch contract. No HTTP, no JSON
//! shapes, no marker logic.

use std::fmt;

use glt_reconcile::VehicleStatus;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`VehicleFeed`] implementation may return.
///
/// All variants mean the same thing to the poller: no update this cycle.
/// They stay distinct for logging and tests.
#[derive(Debug)]
pub enum FeedError {
    /// Network or transport failure (DNS, connect, timeout).
    Transport(String),
    /// The upstream API answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded as the expected JSON shape.
    Decode(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Transport(msg) => write!(f, "transport error: {msg}"),
            FeedError::Api { status, message } => {
                write!(f, "feed api error status={status}: {message}")
            }
            FeedError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}

// ---------------------------------------------------------------------------
// Feed trait
// ---------------------------------------------------------------------------

/// Upstream vehicle-status feed contract.
///
/// Implementations must be object-safe so the poller can hold an
/// `Arc<dyn VehicleFeed>` without knowing the concrete type, and
/// `Send + Sync` so the poll task can own one.
#[async_trait::async_trait]
pub trait VehicleFeed: Send + Sync {
    /// Human-readable name identifying this feed (e.g. `"mbta-v2"`).
    fn name(&self) -> &'static str;

    /// Fetch one fresh snapshot of vehicle statuses.
    ///
    /// Returns `Err` — never `Ok(vec![])` — when the network call or the
    /// payload decode fails. An empty `Ok` list genuinely means no
    /// vehicles are in service on the requested routes.
    async fn fetch_vehicle_statuses(&self) -> Result<Vec<VehicleStatus>, FeedError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
