//! glt-reconcile
//!
//! Marker reconciliation engine for the Green Line tracker.
//!
//! Architectural decisions:
//! - One tracked marker per vehicle id; the marker map is the single
//!   source of truth for what is on screen.
//! - Markers are mutated in place across poll cycles so the rendering
//!   surface can attach transitions to a stable identity.
//! - Each cycle produces an explicit diff (adds / updates / removes)
//!   that the surface consumes imperatively.
//!
//! Deterministic, pure logic. No IO. No network calls.

mod engine;
mod types;

pub use engine::reconcile;
pub use types::*;
