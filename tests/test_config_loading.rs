use smart_parking::build_parking_system;
use smart_parking::domain::clock_mock::MockClock;
use smart_parking::domain::utils::id::VehicleNumber;
use smart_parking::domain::vehicle::VehicleType;
use smart_parking::error::Error;
use smart_parking::load_config;

fn data_file(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_load_small_city() {
    let config = load_config(&data_file("small_city.json")).unwrap();

    assert_eq!((config.zone_count, config.areas_per_zone, config.slots_per_area), (4, 2, 5));
    assert_eq!((config.fees.car, config.fees.bike, config.fees.cross_zone_penalty), (120, 50, 30));
    assert_eq!(config.adjacency, vec![(1, 2), (1, 4), (3, 4)]);
}

#[test]
fn test_configured_facility_uses_configured_fees_and_neighbors() {
    let mut system = build_parking_system(Some(&data_file("small_city.json")), Box::new(MockClock::new(0))).unwrap();

    assert_eq!(system.get_layout().get_total_slots(), 40);
    let zone_4 = system.get_layout().find_zone(4).unwrap();
    assert_eq!(zone_4.get_neighbor_zones(), vec![1, 3]);

    let receipt = system.create_parking_request(&VehicleNumber::new("A"), VehicleType::Car, 2).unwrap();
    assert_eq!(receipt.fee, 120);
    assert_eq!(receipt.location.slot_id, 11);
}

#[test]
fn test_no_config_path_builds_default_city() {
    let system = build_parking_system(None, Box::new(MockClock::new(0))).unwrap();

    assert_eq!(system.get_layout().get_total_slots(), 900);
    assert_eq!(system.zone_status().len(), 15);
}

#[test]
fn test_config_errors() {
    assert!(matches!(load_config(&data_file("invalid_shape.json")), Err(Error::InvalidConfig(_))));
    assert!(matches!(load_config(&data_file("overflowing_fee.json")), Err(Error::InvalidConfig(_))));
    assert!(matches!(load_config(&data_file("truncated.json")), Err(Error::DeserializationError(_))));
    assert!(matches!(load_config(&data_file("missing.json")), Err(Error::IoError(_))));
}
