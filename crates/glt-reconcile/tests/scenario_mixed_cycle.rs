use glt_reconcile::*;

fn status(id: i64, lat: f64) -> VehicleStatus {
    VehicleStatus {
        vehicle_id: VehicleId(id),
        position: Position::new(lat, -71.13),
        bearing_degrees: 270.0,
        direction: Direction::Westbound,
        headsign: "Boston College".to_string(),
        trip_name: format!("trip-{id}"),
    }
}

#[test]
fn scenario_one_cycle_mixes_adds_updates_and_removes() {
    // tracked = {1, 2, 3}; fresh reports 2 (moved) and 9 (new).
    let mut set = MarkerSet::new();
    reconcile(
        &mut set,
        &[status(1, 42.30), status(2, 42.31), status(3, 42.32)],
    );

    let diff = reconcile(&mut set, &[status(2, 42.40), status(9, 42.50)]);

    assert_eq!(diff.updates.len(), 1);
    assert_eq!(diff.updates[0].vehicle_id, VehicleId(2));
    assert!((diff.updates[0].position.lat - 42.40).abs() < 1e-12);

    assert_eq!(diff.adds.len(), 1);
    assert_eq!(diff.adds[0].vehicle_id, VehicleId(9));

    let removed: Vec<i64> = diff.removes.iter().map(|m| m.vehicle_id.0).collect();
    assert_eq!(removed, vec![1, 3]);

    assert_eq!(set.len(), 2);
    assert!(set.contains(VehicleId(2)));
    assert!(set.contains(VehicleId(9)));
}
