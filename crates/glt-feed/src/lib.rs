//! glt-feed
//!
//! Vehicle-status feed boundary for the Green Line tracker.
//!
//! This crate owns the feed abstraction and the concrete MBTA realtime
//! client. It does **not** touch the marker map; the poller fetches
//! statuses here and hands them to `glt-reconcile`.
//!
//! A failed fetch is surfaced as [`FeedError`], never as an empty list,
//! so callers can tell "no vehicles on the line" apart from "couldn't
//! ask". Malformed single records are handled best-effort: a bad
//! direction name degrades to `Direction::None` and a trip without
//! usable telemetry is skipped, without invalidating the rest of the
//! payload.

mod feed;
mod mbta;

pub use feed::{FeedError, VehicleFeed};
pub use mbta::MbtaFeed;
