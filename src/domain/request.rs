use std::fmt;

use serde::Serialize;

use crate::domain::facility::layout::{ParkingLayout, SlotRef};
use crate::domain::utils::id::{RequestNumber, VehicleNumber, ZoneId};
use crate::domain::vehicle::{Vehicle, VehicleType};
use crate::error::{Error, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Lifecycle state of a parking request.
///
/// `Requested -> Allocated -> Occupied -> Released`, and any non-terminal
/// state can move to `Cancelled`. `Released` and `Cancelled` are terminal for
/// the operator; only a rollback can bring a cancelled request back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    /// Booking submitted, no slot held yet.
    Requested,

    /// A slot is reserved for the vehicle.
    Allocated,

    /// The vehicle is standing in its slot.
    Occupied,

    /// The vehicle left and the slot was returned.
    Released,

    /// The booking was withdrawn.
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Released | RequestState::Cancelled)
    }

    pub fn holds_slot(&self) -> bool {
        matches!(self, RequestState::Allocated | RequestState::Occupied)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Requested => "REQUESTED",
            RequestState::Allocated => "ALLOCATED",
            RequestState::Occupied => "OCCUPIED",
            RequestState::Released => "RELEASED",
            RequestState::Cancelled => "CANCELLED",
        };
        write!(f, "{}", name)
    }
}

/// One parking transaction for one vehicle.
///
/// The request never owns its slot: it keeps a [`SlotRef`] into the layout
/// and every transition that touches slot availability borrows the layout.
/// The slot handle is kept after cancellation and release so history and
/// rollback can still see where the vehicle was parked.
#[derive(Debug, Clone)]
pub struct ParkingRequest {
    request_id: RequestNumber,
    vehicle: Vehicle,
    requested_zone_id: ZoneId,
    allocated_slot: Option<SlotRef>,
    state: RequestState,

    // Unix seconds
    request_time: i64,
    occupy_time: Option<i64>,
    release_time: Option<i64>,
}

impl ParkingRequest {
    pub fn new(request_id: RequestNumber, vehicle: Vehicle, requested_zone_id: ZoneId, request_time: i64) -> Self {
        ParkingRequest {
            request_id,
            vehicle,
            requested_zone_id,
            allocated_slot: None,
            state: RequestState::Requested,
            request_time,
            occupy_time: None,
            release_time: None,
        }
    }

    // --- Identity ---

    pub fn get_request_id(&self) -> RequestNumber {
        self.request_id
    }

    pub fn get_vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn get_vehicle_number(&self) -> &VehicleNumber {
        self.vehicle.get_vehicle_number()
    }

    pub fn get_vehicle_type(&self) -> VehicleType {
        self.vehicle.get_vehicle_type()
    }

    pub fn get_state(&self) -> RequestState {
        self.state
    }

    pub fn get_requested_zone_id(&self) -> ZoneId {
        self.requested_zone_id
    }

    pub fn get_allocated_slot(&self) -> Option<SlotRef> {
        self.allocated_slot
    }

    // --- Lifecycle ---

    /// `Requested` + free slot -> `Allocated`; the slot becomes occupied.
    pub fn allocate_slot(&mut self, layout: &mut ParkingLayout, slot_ref: SlotRef) -> Result<()> {
        if self.state != RequestState::Requested {
            return Err(Error::InvalidTransition { action: "allocate", from: self.state });
        }

        self.take_slot(layout, slot_ref)?;
        self.state = RequestState::Allocated;
        Ok(())
    }

    /// `Allocated` -> `Occupied`, stamping the occupy time.
    pub fn occupy(&mut self, now: i64) -> Result<()> {
        if self.state != RequestState::Allocated {
            return Err(Error::InvalidTransition { action: "occupy", from: self.state });
        }

        self.occupy_time = Some(now);
        self.state = RequestState::Occupied;
        Ok(())
    }

    /// `Occupied` -> `Released`; frees the slot and stamps the release time.
    pub fn release(&mut self, layout: &mut ParkingLayout, now: i64) -> Result<()> {
        if self.state != RequestState::Occupied {
            return Err(Error::InvalidTransition { action: "release", from: self.state });
        }
        let slot_ref = self.allocated_slot.ok_or(Error::InvalidTransition { action: "release", from: self.state })?;
        let slot = layout.slot_mut(slot_ref).ok_or(Error::UnknownSlot(slot_ref))?;

        slot.mark_free();
        self.release_time = Some(now);
        self.state = RequestState::Released;
        Ok(())
    }

    /// Any non-terminal state -> `Cancelled`.
    ///
    /// Only a request leaving `Allocated` hands its slot back.
    pub fn cancel(&mut self, layout: &mut ParkingLayout) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::InvalidTransition { action: "cancel", from: self.state });
        }

        if self.state == RequestState::Allocated {
            if let Some(slot) = self.allocated_slot.and_then(|slot_ref| layout.slot_mut(slot_ref)) {
                slot.mark_free();
            }
        }

        self.state = RequestState::Cancelled;
        Ok(())
    }

    /// `Cancelled` -> `Allocated` on the slot the request held before.
    ///
    /// Only the rollback of a cancellation takes this path.
    pub fn restore_allocation(&mut self, layout: &mut ParkingLayout) -> Result<()> {
        if self.state != RequestState::Cancelled {
            return Err(Error::InvalidTransition { action: "restore", from: self.state });
        }
        let slot_ref = self.allocated_slot.ok_or(Error::InvalidTransition { action: "restore", from: self.state })?;

        self.take_slot(layout, slot_ref)?;
        self.state = RequestState::Allocated;
        Ok(())
    }

    fn take_slot(&mut self, layout: &mut ParkingLayout, slot_ref: SlotRef) -> Result<()> {
        let slot = layout.slot_mut(slot_ref).ok_or(Error::UnknownSlot(slot_ref))?;
        if !slot.is_available() {
            return Err(Error::SlotUnavailable { slot_id: slot.get_slot_id() });
        }

        slot.mark_occupied();
        self.allocated_slot = Some(slot_ref);
        Ok(())
    }

    // --- Time & analytics ---

    pub fn get_request_time(&self) -> i64 {
        self.request_time
    }

    pub fn get_occupy_time(&self) -> Option<i64> {
        self.occupy_time
    }

    pub fn get_release_time(&self) -> Option<i64> {
        self.release_time
    }

    /// Hours between occupy and release. Zero unless the request is
    /// `Released` with both timestamps set.
    pub fn get_parking_duration_hours(&self) -> f64 {
        match (self.state, self.occupy_time, self.release_time) {
            (RequestState::Released, Some(occupied), Some(released)) => (released - occupied) as f64 / SECONDS_PER_HOUR,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FacilityConfig;

    fn setup() -> (ParkingLayout, ParkingRequest) {
        let layout = ParkingLayout::from_config(&FacilityConfig::with_shape(1, 1, 2).unwrap());
        let vehicle = Vehicle::new(VehicleNumber::new("MH-12"), VehicleType::Car, 1);
        (layout, ParkingRequest::new(1, vehicle, 1, 1_000))
    }

    #[test]
    fn test_full_lifecycle_frees_slot_on_release() {
        let (mut layout, mut request) = setup();
        let slot_ref = SlotRef::new(0, 0, 0);

        request.allocate_slot(&mut layout, slot_ref).unwrap();
        assert_eq!(request.get_state(), RequestState::Allocated);
        assert!(!layout.slot(slot_ref).unwrap().is_available());

        request.occupy(2_000).unwrap();
        request.release(&mut layout, 2_000 + 5_400).unwrap();

        assert_eq!(request.get_state(), RequestState::Released);
        assert!(layout.slot(slot_ref).unwrap().is_available());
        assert!((request.get_parking_duration_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_allocate_requires_free_slot_and_requested_state() {
        let (mut layout, mut request) = setup();
        let slot_ref = SlotRef::new(0, 0, 0);
        layout.slot_mut(slot_ref).unwrap().mark_occupied();

        assert!(matches!(request.allocate_slot(&mut layout, slot_ref), Err(Error::SlotUnavailable { slot_id: 1 })));
        assert_eq!(request.get_state(), RequestState::Requested);
        assert_eq!(request.get_allocated_slot(), None);

        request.allocate_slot(&mut layout, SlotRef::new(0, 0, 1)).unwrap();
        let again = request.allocate_slot(&mut layout, SlotRef::new(0, 0, 1));
        assert!(matches!(again, Err(Error::InvalidTransition { action: "allocate", from: RequestState::Allocated })));
    }

    #[test]
    fn test_occupy_and_release_enforce_order() {
        let (mut layout, mut request) = setup();

        assert!(request.occupy(10).is_err());
        assert!(request.release(&mut layout, 10).is_err());
        assert_eq!(request.get_occupy_time(), None);
        assert_eq!(request.get_parking_duration_hours(), 0.0);
    }

    #[test]
    fn test_cancel_from_allocated_frees_slot() {
        let (mut layout, mut request) = setup();
        let slot_ref = SlotRef::new(0, 0, 0);
        request.allocate_slot(&mut layout, slot_ref).unwrap();

        request.cancel(&mut layout).unwrap();

        assert_eq!(request.get_state(), RequestState::Cancelled);
        assert!(layout.slot(slot_ref).unwrap().is_available());
        assert_eq!(request.get_allocated_slot(), Some(slot_ref));
        assert!(request.cancel(&mut layout).is_err());
    }

    #[test]
    fn test_cancel_after_release_is_rejected() {
        let (mut layout, mut request) = setup();
        request.allocate_slot(&mut layout, SlotRef::new(0, 0, 0)).unwrap();
        request.occupy(0).unwrap();
        request.release(&mut layout, 60).unwrap();

        assert!(matches!(request.cancel(&mut layout), Err(Error::InvalidTransition { action: "cancel", from: RequestState::Released })));
    }

    #[test]
    fn test_restore_allocation_reoccupies_previous_slot() {
        let (mut layout, mut request) = setup();
        let slot_ref = SlotRef::new(0, 0, 1);
        request.allocate_slot(&mut layout, slot_ref).unwrap();
        request.cancel(&mut layout).unwrap();

        request.restore_allocation(&mut layout).unwrap();

        assert_eq!(request.get_state(), RequestState::Allocated);
        assert!(!layout.slot(slot_ref).unwrap().is_available());
    }
}
