//! glt-runtime
//!
//! Wires the feed, the reconciler and the map surface together: owns the
//! poll loop and its start/stop lifecycle. The surface is a trait so the
//! binary can log to the console while tests record diffs in memory; a
//! real rendering backend plugs in at the same seam.

mod poller;
mod surface;

pub use poller::{Poller, PollerHandle};
pub use surface::{marker_glyph, ConsoleSurface, MapSurface, RecordingSurface};
