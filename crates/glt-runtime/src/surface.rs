//! Map-surface boundary.
//!
//! The reconciler produces explicit diffs; a surface consumes them
//! imperatively. Styling is dispatched on `MarkerKind` + `Direction`
//! through a lookup, not an inheritance hierarchy.

use std::sync::{Arc, Mutex};

use glt_reconcile::{Direction, MarkerKind, ReconcileDiff};
use glt_route::RouteOverlay;
use serde::Serialize;
use tracing::info;

/// Rendering boundary for one tracked map.
///
/// `apply` receives the diff of every successful reconcile cycle,
/// including empty ones; a failed fetch never reaches the surface.
/// `set_overlay` is called at most once, at startup.
pub trait MapSurface: Send {
    fn set_overlay(&mut self, overlay: &RouteOverlay);
    fn apply(&mut self, diff: &ReconcileDiff);
}

/// Glyph lookup for marker styling. Trains are styled by travel
/// direction; stations have a single fixed style.
pub fn marker_glyph(kind: MarkerKind, direction: Direction) -> &'static str {
    match kind {
        MarkerKind::Station => "station",
        MarkerKind::Train => match direction {
            Direction::None => "train",
            Direction::Northbound => "train-north",
            Direction::Eastbound => "train-east",
            Direction::Southbound => "train-south",
            Direction::Westbound => "train-west",
        },
    }
}

// ---------------------------------------------------------------------------
// ConsoleSurface
// ---------------------------------------------------------------------------

/// Surface used by the `glt-tracker` binary: renders each cycle as log
/// lines, or as one JSON line per cycle in `json` mode.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    json: bool,
}

/// One cycle as emitted in JSON mode.
#[derive(Serialize)]
struct CycleLine<'a> {
    ts_millis: i64,
    #[serde(flatten)]
    diff: &'a ReconcileDiff,
}

impl ConsoleSurface {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl MapSurface for ConsoleSurface {
    fn set_overlay(&mut self, overlay: &RouteOverlay) {
        info!(
            polyline_points = overlay.polyline.len(),
            stations = overlay.stations.len(),
            "route overlay placed"
        );
        for station in &overlay.stations {
            info!(
                name = %station.name,
                lat = station.position.lat,
                lon = station.position.lon,
                glyph = marker_glyph(station.kind(), Direction::None),
                "station marker"
            );
        }
    }

    fn apply(&mut self, diff: &ReconcileDiff) {
        if self.json {
            let line = CycleLine {
                ts_millis: chrono::Utc::now().timestamp_millis(),
                diff,
            };
            match serde_json::to_string(&line) {
                Ok(s) => println!("{s}"),
                Err(e) => info!(error = %e, "could not serialise cycle"),
            }
            return;
        }

        for m in &diff.adds {
            info!(
                vehicle = %m.vehicle_id,
                lat = m.position.lat,
                lon = m.position.lon,
                glyph = marker_glyph(m.kind(), m.direction),
                label = %m.label,
                "marker added"
            );
        }
        for m in &diff.updates {
            info!(
                vehicle = %m.vehicle_id,
                lat = m.position.lat,
                lon = m.position.lon,
                bearing = m.bearing_degrees,
                "marker moved"
            );
        }
        for m in &diff.removes {
            info!(vehicle = %m.vehicle_id, "marker removed");
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingSurface
// ---------------------------------------------------------------------------

/// In-memory surface for tests: records every diff it receives.
///
/// The handle is cheap to clone; the poller takes the surface itself
/// while the test keeps a handle to inspect what was applied.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    applied: Arc<Mutex<Vec<ReconcileDiff>>>,
    overlays: Arc<Mutex<Vec<RouteOverlay>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<ReconcileDiff> {
        self.applied.lock().expect("recording surface lock").clone()
    }

    pub fn overlays(&self) -> Vec<RouteOverlay> {
        self.overlays.lock().expect("recording surface lock").clone()
    }
}

impl MapSurface for RecordingSurface {
    fn set_overlay(&mut self, overlay: &RouteOverlay) {
        self.overlays
            .lock()
            .expect("recording surface lock")
            .push(overlay.clone());
    }

    fn apply(&mut self, diff: &ReconcileDiff) {
        self.applied
            .lock()
            .expect("recording surface lock")
            .push(diff.clone());
    }
}
