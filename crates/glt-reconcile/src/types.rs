use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Vehicle identity as reported by the feed. The reconciliation key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Compass heading of a trip, used by the surface to pick a marker style.
///
/// `None` is a real value, not an absence: the feed degrades an unknown or
/// malformed direction name to `None` and keeps the record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Northbound,
    Eastbound,
    Southbound,
    Westbound,
}

impl Direction {
    /// Best-effort parse of an API direction name. Unknown strings map to
    /// `Direction::None`; the caller keeps the record either way.
    pub fn parse_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "northbound" => Direction::Northbound,
            "eastbound" => Direction::Eastbound,
            "southbound" => Direction::Southbound,
            "westbound" => Direction::Westbound,
            _ => Direction::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "none",
            Direction::Northbound => "northbound",
            Direction::Eastbound => "eastbound",
            Direction::Southbound => "southbound",
            Direction::Westbound => "westbound",
        }
    }
}

/// One polled snapshot of a train's realtime position and heading.
///
/// Produced fresh each poll cycle by the feed; never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub vehicle_id: VehicleId,
    pub position: Position,
    pub bearing_degrees: f64,
    pub direction: Direction,
    /// Destination shown to riders (e.g. "Boston College").
    pub headsign: String,
    pub trip_name: String,
}

/// Marker category dispatched at the rendering boundary.
///
/// Trains are reconciled every cycle; stations come from the static route
/// overlay and are placed once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Train,
    Station,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Train => "train",
            MarkerKind::Station => "station",
        }
    }
}

/// The on-screen representation bound 1:1 to a vehicle id, reused across
/// polls.
///
/// `marker_uid` is assigned once when the marker is first added and never
/// reassigned; it is the identity the surface keys transitions on. All
/// other fields are overwritten in place on every cycle that reports the
/// vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedMarker {
    /// Stable identity token. Survives every update; dies with the marker.
    pub marker_uid: u64,
    pub vehicle_id: VehicleId,
    pub position: Position,
    pub bearing_degrees: f64,
    pub direction: Direction,
    /// Display label, derived from the trip headsign.
    pub label: String,
    /// Sweep flag, transient within one reconcile pass. Always `false`
    /// between cycles.
    pub marked_for_removal: bool,
}

impl TrackedMarker {
    /// Overwrite the mutable fields from a fresh status, preserving
    /// `marker_uid`.
    pub fn apply_status(&mut self, status: &VehicleStatus) {
        self.position = status.position;
        self.bearing_degrees = status.bearing_degrees;
        self.direction = status.direction;
        self.label = status.headsign.clone();
    }

    pub fn kind(&self) -> MarkerKind {
        MarkerKind::Train
    }
}

/// Owns the vehicle-id → marker map and the uid counter.
///
/// Invariant: at most one marker per vehicle id. Iteration order is
/// deterministic (BTreeMap, keyed by vehicle id).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerSet {
    markers: BTreeMap<VehicleId, TrackedMarker>,
    next_uid: u64,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn get(&self, id: VehicleId) -> Option<&TrackedMarker> {
        self.markers.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedMarker> {
        self.markers.values()
    }

    /// Insert a brand-new marker for `status`, assigning the next uid.
    ///
    /// Panics in debug builds if the id is already tracked; callers
    /// (the engine) check first.
    pub(crate) fn insert_new(&mut self, status: &VehicleStatus) -> &TrackedMarker {
        debug_assert!(!self.markers.contains_key(&status.vehicle_id));
        let uid = self.next_uid;
        self.next_uid += 1;
        let marker = TrackedMarker {
            marker_uid: uid,
            vehicle_id: status.vehicle_id,
            position: status.position,
            bearing_degrees: status.bearing_degrees,
            direction: status.direction,
            label: status.headsign.clone(),
            marked_for_removal: false,
        };
        self.markers.insert(status.vehicle_id, marker);
        &self.markers[&status.vehicle_id]
    }

    pub(crate) fn get_mut(&mut self, id: VehicleId) -> Option<&mut TrackedMarker> {
        self.markers.get_mut(&id)
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut TrackedMarker> {
        self.markers.values_mut()
    }

    pub(crate) fn remove(&mut self, id: VehicleId) -> Option<TrackedMarker> {
        self.markers.remove(&id)
    }

    pub(crate) fn ids(&self) -> Vec<VehicleId> {
        self.markers.keys().copied().collect()
    }
}

/// What one reconcile cycle changed. Consumed imperatively by the map
/// surface; entries carry clones of the post-cycle marker state.
///
/// Ordering is deterministic: each list is sorted by vehicle id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReconcileDiff {
    /// Markers that did not exist before this cycle.
    pub adds: Vec<TrackedMarker>,
    /// Markers that existed and were mutated in place.
    pub updates: Vec<TrackedMarker>,
    /// Markers dropped from the map this cycle (final state as removed).
    pub removes: Vec<TrackedMarker>,
}

impl ReconcileDiff {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }
}
