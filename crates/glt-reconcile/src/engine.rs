use std::collections::BTreeSet;

use crate::{MarkerSet, ReconcileDiff, VehicleId, VehicleStatus};

/// Reconcile the tracked marker set against one fresh snapshot.
///
/// - Every marker is first flagged for removal.
/// - Each fresh status either clears the flag and mutates the existing
///   marker in place (an update) or inserts a new marker (an add).
/// - Markers still flagged after the pass are dropped and reported as
///   removes.
///
/// An empty snapshot therefore removes everything. A duplicate vehicle id
/// within one snapshot is resolved last-one-wins, and the id appears at
/// most once in the diff: a vehicle first seen this cycle stays an add
/// even when a later duplicate overwrites its fields.
///
/// The caller must not invoke this at all when the fetch failed; skipping
/// the cycle is what keeps markers from flickering on transient network
/// errors.
pub fn reconcile(markers: &mut MarkerSet, fresh: &[VehicleStatus]) -> ReconcileDiff {
    // 1) Flag sweep candidates.
    for marker in markers.values_mut() {
        marker.marked_for_removal = true;
    }

    // 2) Apply fresh statuses in order.
    let mut added: BTreeSet<VehicleId> = BTreeSet::new();
    let mut updated: BTreeSet<VehicleId> = BTreeSet::new();

    for status in fresh {
        match markers.get_mut(status.vehicle_id) {
            Some(existing) => {
                existing.marked_for_removal = false;
                existing.apply_status(status);
                // A duplicate of a marker added earlier in this same pass
                // is still an add, just with the later fields.
                if !added.contains(&status.vehicle_id) {
                    updated.insert(status.vehicle_id);
                }
            }
            None => {
                markers.insert_new(status);
                added.insert(status.vehicle_id);
            }
        }
    }

    // 3) Sweep.
    let mut removes = Vec::new();
    for id in markers.ids() {
        let still_flagged = markers
            .get(id)
            .map(|m| m.marked_for_removal)
            .unwrap_or(false);
        if still_flagged {
            if let Some(dropped) = markers.remove(id) {
                removes.push(dropped);
            }
        }
    }

    // Diff entries carry the post-cycle state, sorted by vehicle id
    // (map iteration order).
    let mut diff = ReconcileDiff {
        adds: Vec::with_capacity(added.len()),
        updates: Vec::with_capacity(updated.len()),
        removes,
    };
    for marker in markers.iter() {
        if added.contains(&marker.vehicle_id) {
            diff.adds.push(marker.clone());
        } else if updated.contains(&marker.vehicle_id) {
            diff.updates.push(marker.clone());
        }
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, Position, VehicleStatus};

    fn status(id: i64, lat: f64, lon: f64) -> VehicleStatus {
        VehicleStatus {
            vehicle_id: VehicleId(id),
            position: Position::new(lat, lon),
            bearing_degrees: 90.0,
            direction: Direction::Westbound,
            headsign: "Boston College".to_string(),
            trip_name: format!("trip-{id}"),
        }
    }

    /// Seed in a single pass; seeding one-by-one would sweep earlier ids.
    fn seeded(ids: &[i64]) -> MarkerSet {
        let fresh: Vec<VehicleStatus> = ids.iter().map(|&id| status(id, 42.0, -71.0)).collect();
        let mut set = MarkerSet::new();
        reconcile(&mut set, &fresh);
        set
    }

    #[test]
    fn add_then_update_preserves_uid() {
        let mut set = MarkerSet::new();

        let d1 = reconcile(&mut set, &[status(1, 42.35, -71.13)]);
        assert_eq!(d1.adds.len(), 1);
        let uid = d1.adds[0].marker_uid;

        let d2 = reconcile(&mut set, &[status(1, 42.36, -71.14)]);
        assert!(d2.adds.is_empty());
        assert_eq!(d2.updates.len(), 1);
        assert_eq!(d2.updates[0].marker_uid, uid);
        assert_eq!(set.get(VehicleId(1)).unwrap().marker_uid, uid);
        assert_eq!(set.get(VehicleId(1)).unwrap().position.lat, 42.36);
    }

    #[test]
    fn empty_snapshot_removes_everything() {
        let mut set = seeded(&[1, 2, 3]);
        let diff = reconcile(&mut set, &[]);
        assert_eq!(diff.removes.len(), 3);
        assert!(diff.adds.is_empty());
        assert!(diff.updates.is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn new_only_id_is_exactly_one_add() {
        let mut set = seeded(&[1]);
        let before = set.len();
        let diff = reconcile(&mut set, &[status(1, 42.0, -71.0), status(2, 42.1, -71.1)]);
        assert_eq!(diff.adds.len(), 1);
        assert_eq!(diff.adds[0].vehicle_id, VehicleId(2));
        assert_eq!(set.len(), before + 1);
    }

    #[test]
    fn worked_example_update_and_add() {
        // tracked = {1: A}, fresh = [{1, B}, {2, C}]
        let mut set = seeded(&[1]);
        let diff = reconcile(&mut set, &[status(1, 42.5, -71.5), status(2, 42.6, -71.6)]);

        assert_eq!(diff.updates.len(), 1);
        assert_eq!(diff.updates[0].vehicle_id, VehicleId(1));
        assert_eq!(diff.updates[0].position.lat, 42.5);

        assert_eq!(diff.adds.len(), 1);
        assert_eq!(diff.adds[0].vehicle_id, VehicleId(2));
        assert_eq!(diff.adds[0].position.lat, 42.6);

        assert!(diff.removes.is_empty());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn worked_example_partial_snapshot_removes_missing() {
        // tracked = {1, 2, 3}, fresh = [{2}]
        let mut set = seeded(&[1, 2, 3]);
        let diff = reconcile(&mut set, &[status(2, 42.9, -71.9)]);

        assert_eq!(diff.updates.len(), 1);
        assert_eq!(diff.updates[0].vehicle_id, VehicleId(2));

        let removed: Vec<VehicleId> = diff.removes.iter().map(|m| m.vehicle_id).collect();
        assert_eq!(removed, vec![VehicleId(1), VehicleId(3)]);

        assert_eq!(set.len(), 1);
        assert!(set.contains(VehicleId(2)));
    }

    #[test]
    fn duplicate_id_in_snapshot_last_one_wins() {
        let mut set = MarkerSet::new();
        let mut first = status(7, 42.1, -71.1);
        first.headsign = "Cleveland Circle".to_string();
        let second = status(7, 42.2, -71.2);

        let diff = reconcile(&mut set, &[first, second]);

        // Still a single add, carrying the later fields.
        assert_eq!(diff.adds.len(), 1);
        assert!(diff.updates.is_empty());
        assert_eq!(diff.adds[0].position.lat, 42.2);
        assert_eq!(diff.adds[0].label, "Boston College");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_of_existing_marker_is_a_single_update() {
        let mut set = seeded(&[7]);
        let diff = reconcile(&mut set, &[status(7, 42.1, -71.1), status(7, 42.2, -71.2)]);
        assert_eq!(diff.updates.len(), 1);
        assert_eq!(diff.updates[0].position.lat, 42.2);
        assert!(diff.adds.is_empty());
    }

    #[test]
    fn no_flag_leaks_between_cycles() {
        let mut set = seeded(&[1, 2]);
        reconcile(&mut set, &[status(1, 42.0, -71.0), status(2, 42.0, -71.0)]);
        assert!(set.iter().all(|m| !m.marked_for_removal));
    }

    #[test]
    fn uids_are_never_reused_after_removal() {
        let mut set = MarkerSet::new();
        let d1 = reconcile(&mut set, &[status(1, 42.0, -71.0)]);
        let first_uid = d1.adds[0].marker_uid;

        reconcile(&mut set, &[]);
        let d3 = reconcile(&mut set, &[status(1, 42.0, -71.0)]);

        // Same vehicle id, but a fresh marker: identity must not be recycled.
        assert_ne!(d3.adds[0].marker_uid, first_uid);
    }

    #[test]
    fn removed_marker_carries_last_known_state() {
        let mut set = seeded(&[5]);
        let label = set.get(VehicleId(5)).unwrap().label.clone();
        let diff = reconcile(&mut set, &[]);
        assert_eq!(diff.removes[0].vehicle_id, VehicleId(5));
        assert_eq!(diff.removes[0].label, label);
    }

    #[test]
    fn marker_kind_is_train() {
        let set = seeded(&[1]);
        assert_eq!(
            set.get(VehicleId(1)).unwrap().kind(),
            crate::MarkerKind::Train
        );
    }

    #[test]
    fn direction_parse_is_best_effort() {
        assert_eq!(Direction::parse_name("Westbound"), Direction::Westbound);
        assert_eq!(Direction::parse_name(" eastbound "), Direction::Eastbound);
        assert_eq!(Direction::parse_name("Inbound"), Direction::None);
        assert_eq!(Direction::parse_name(""), Direction::None);
    }
}
