use smart_parking::domain::clock_mock::MockClock;
use smart_parking::domain::config::FacilityConfig;
use smart_parking::domain::parking_system::ParkingSystem;
use smart_parking::domain::request::RequestState;
use smart_parking::domain::utils::id::VehicleNumber;
use smart_parking::domain::vehicle::VehicleType;
use smart_parking::error::Error;

const START: i64 = 1_700_000_000;

fn city(clock: &MockClock) -> ParkingSystem {
    ParkingSystem::new(FacilityConfig::default(), Box::new(clock.clone()))
}

#[test]
fn test_occupy_then_release_reports_duration() {
    let clock = MockClock::new(START);
    let mut system = city(&clock);
    let number = VehicleNumber::new("LEA-42");

    system.create_parking_request(&number, VehicleType::Car, 7).unwrap();
    clock.advance(300);
    system.occupy_parking(&number, VehicleType::Car).unwrap();
    assert_eq!(system.find_request(&number, VehicleType::Car).unwrap().get_parking_duration_hours(), 0.0);

    clock.advance(2 * 3600 + 1800);
    let receipt = system.release_parking(&number, VehicleType::Car).unwrap();

    assert!((receipt.duration_hours - 2.5).abs() < 1e-9);
    assert_eq!(receipt.location.zone_id, 7);

    let request = system.find_request(&number, VehicleType::Car).unwrap();
    assert_eq!(request.get_state(), RequestState::Released);
    assert_eq!(request.get_occupy_time(), Some(START + 300));
    assert_eq!(request.get_release_time(), Some(START + 300 + 9000));
    assert_eq!(system.get_layout().get_free_slots(), 900);
}

#[test]
fn test_transitions_out_of_order_are_rejected() {
    let clock = MockClock::new(START);
    let mut system = city(&clock);
    let number = VehicleNumber::new("B-9");

    system.create_parking_request(&number, VehicleType::Bike, 2).unwrap();
    assert!(matches!(system.release_parking(&number, VehicleType::Bike), Err(Error::InvalidTransition { action: "release", .. })));

    system.occupy_parking(&number, VehicleType::Bike).unwrap();
    assert!(matches!(system.occupy_parking(&number, VehicleType::Bike), Err(Error::InvalidTransition { action: "occupy", .. })));

    system.release_parking(&number, VehicleType::Bike).unwrap();
    assert!(matches!(system.cancel_request(&number, VehicleType::Bike), Err(Error::InvalidTransition { action: "cancel", .. })));
}

#[test]
fn test_cancelled_request_cannot_be_occupied() {
    let clock = MockClock::new(START);
    let mut system = city(&clock);
    let number = VehicleNumber::new("C-1");

    system.create_parking_request_with_area(&number, VehicleType::Car, 1, 2).unwrap();
    let freed = system.cancel_request(&number, VehicleType::Car).unwrap();

    assert_eq!(freed.map(|slot| (slot.zone_id, slot.area_id, slot.slot_id)), Some((1, 2, 21)));
    assert!(system.occupy_parking(&number, VehicleType::Car).is_err());
    assert_eq!(system.get_layout().get_free_slots(), 900);
}

#[test]
fn test_history_csv_records_timestamps() {
    let clock = MockClock::new(START);
    let mut system = city(&clock);
    let number = VehicleNumber::new("LEA-1");
    system.create_parking_request(&number, VehicleType::Car, 1).unwrap();
    clock.set_time(START + 60);
    system.occupy_parking(&number, VehicleType::Car).unwrap();
    clock.set_time(START + 3660);
    system.release_parking(&number, VehicleType::Car).unwrap();

    let mut buffer = Vec::new();
    system.write_history_csv(&mut buffer).unwrap();
    let csv = String::from_utf8(buffer).unwrap();

    assert_eq!(csv.lines().nth(1), Some("1,LEA-1,Car,1,RELEASED,1,1,1,1700000000,1700000060,1700003660,1.0"));
}

#[test]
fn test_cancel_while_occupied_keeps_slot_and_rollback_restores_allocation() {
    let clock = MockClock::new(START);
    let mut system = city(&clock);
    let number = VehicleNumber::new("OCC-7");

    system.create_parking_request(&number, VehicleType::Car, 3).unwrap();
    clock.advance(120);
    let slot = system.occupy_parking(&number, VehicleType::Car).unwrap();
    assert_eq!(system.get_layout().get_free_slots(), 899);
    assert_eq!(system.rollback_depth(), 1);

    // The vehicle is still parked, so the slot is not handed back.
    let cancelled_at = system.cancel_request(&number, VehicleType::Car).unwrap();
    assert_eq!(cancelled_at, Some(slot));
    assert_eq!(system.find_request(&number, VehicleType::Car).unwrap().get_state(), RequestState::Cancelled);
    assert_eq!(system.get_layout().get_free_slots(), 899);
    assert_eq!(system.rollback_depth(), 2);

    system.rollback(1).unwrap();

    let request = system.find_request(&number, VehicleType::Car).unwrap();
    assert_eq!(request.get_state(), RequestState::Allocated);
    assert!(request.get_allocated_slot().is_some());
    assert_eq!(system.get_layout().get_free_slots(), 899);
    assert_eq!(system.rollback_depth(), 1);
    assert!(matches!(system.create_parking_request(&number, VehicleType::Car, 3), Err(Error::DuplicateVehicle { .. })));
}
