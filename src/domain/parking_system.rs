use std::io::Write;

use crate::domain::allocation::AllocationEngine;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::config::FacilityConfig;
use crate::domain::facility::layout::ParkingLayout;
use crate::domain::report::{HistoryRecord, ParkingReceipt, ReleaseReceipt, RequestSummary, SlotLocation, ZoneStatus};
use crate::domain::request::{ParkingRequest, RequestState};
use crate::domain::request_store::{RequestId, RequestStore};
use crate::domain::rollback::RollbackManager;
use crate::domain::utils::id::{AreaId, RequestNumber, VehicleNumber, ZoneId};
use crate::domain::vehicle::{Vehicle, VehicleType};
use crate::error::{Error, Result};

/// The facility: owns every zone, vehicle and request, plus the single
/// allocation engine and rollback log, and hands them to each other
/// explicitly on every call.
#[derive(Debug)]
pub struct ParkingSystem {
    config: FacilityConfig,
    layout: ParkingLayout,
    vehicles: Vec<Vehicle>,
    requests: RequestStore,
    allocation_engine: AllocationEngine,
    rollback_manager: RollbackManager,
    clock: Box<dyn Clock>,
    next_request_id: RequestNumber,
}

impl ParkingSystem {
    pub fn new(config: FacilityConfig, clock: Box<dyn Clock>) -> Self {
        let layout = ParkingLayout::from_config(&config);
        let allocation_engine = AllocationEngine::new(config.fees);

        log::info!(
            "Parking system ready: {} zones x {} areas x {} slots ({} slots).",
            config.zone_count,
            config.areas_per_zone,
            config.slots_per_area,
            config.total_slots()
        );

        ParkingSystem {
            config,
            layout,
            vehicles: Vec::new(),
            requests: RequestStore::new(),
            allocation_engine,
            rollback_manager: RollbackManager::new(),
            clock,
            next_request_id: 1,
        }
    }

    /// The built-in city (15 x 3 x 20) on the system clock.
    pub fn with_defaults() -> Self {
        ParkingSystem::new(FacilityConfig::default(), Box::new(SystemClock))
    }

    // --- Accessors ---

    pub fn get_config(&self) -> &FacilityConfig {
        &self.config
    }

    pub fn get_layout(&self) -> &ParkingLayout {
        &self.layout
    }

    pub fn get_requests(&self) -> &RequestStore {
        &self.requests
    }

    pub fn get_vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn rollback_depth(&self) -> usize {
        self.rollback_manager.len()
    }

    /// Current request of the vehicle, if it ever booked.
    ///
    /// A request holding a slot wins over newer terminal or pending ones.
    pub fn find_request(&self, number: &VehicleNumber, vehicle_type: VehicleType) -> Option<&ParkingRequest> {
        self.requests.find_current_by_vehicle(number, vehicle_type).and_then(|key| self.requests.get(key))
    }

    // --- Booking ---

    /// Books a slot without area preference.
    ///
    /// The request is kept even when no slot is found; it stays `Requested`
    /// and can be retried or cancelled.
    pub fn create_parking_request(&mut self, number: &VehicleNumber, vehicle_type: VehicleType, preferred_zone: ZoneId) -> Result<ParkingReceipt> {
        let key = self.submit(number, vehicle_type, preferred_zone)?;
        self.allocate(key, None)
    }

    /// Books a slot preferring `preferred_area` inside `preferred_zone`.
    pub fn create_parking_request_with_area(
        &mut self,
        number: &VehicleNumber,
        vehicle_type: VehicleType,
        preferred_zone: ZoneId,
        preferred_area: AreaId,
    ) -> Result<ParkingReceipt> {
        self.validate_area(preferred_area)?;
        let key = self.submit(number, vehicle_type, preferred_zone)?;
        self.allocate(key, Some(preferred_area))
    }

    /// Runs allocation again for a vehicle whose current request is still `Requested`.
    pub fn retry_request(&mut self, number: &VehicleNumber, vehicle_type: VehicleType, preferred_area: Option<AreaId>) -> Result<ParkingReceipt> {
        if let Some(area) = preferred_area {
            self.validate_area(area)?;
        }
        let key = self.find_request_key(number, vehicle_type)?;
        self.allocate(key, preferred_area)
    }

    fn submit(&mut self, number: &VehicleNumber, vehicle_type: VehicleType, preferred_zone: ZoneId) -> Result<RequestId> {
        self.validate_zone(preferred_zone)?;

        let has_active_request = self.find_request(number, vehicle_type).is_some_and(|request| !request.get_state().is_terminal());
        if has_active_request {
            log::warn!("Vehicle {} ({}) already exists in system with an active request.", number, vehicle_type);
            return Err(Error::DuplicateVehicle { number: number.clone(), vehicle_type });
        }

        let vehicle = Vehicle::new(number.clone(), vehicle_type, preferred_zone);
        if !self.vehicles.iter().any(|known| known.is_same_vehicle(&vehicle)) {
            self.vehicles.push(vehicle.clone());
        }

        let request = ParkingRequest::new(self.next_request_id, vehicle, preferred_zone, self.clock.now_in_s());
        self.next_request_id += 1;

        Ok(self.requests.add(request))
    }

    fn allocate(&mut self, key: RequestId, preferred_area: Option<AreaId>) -> Result<ParkingReceipt> {
        let request = self.requests.get_mut(key).ok_or(Error::StaleRequest)?;

        let outcome = match preferred_area {
            Some(area) => self.allocation_engine.allocate_slot_with_area(&mut self.layout, &mut self.rollback_manager, key, request, area),
            None => self.allocation_engine.allocate_slot(&mut self.layout, &mut self.rollback_manager, key, request),
        };

        let allocation = match outcome {
            Ok(allocation) => allocation,
            Err(e) => {
                log::warn!("Allocation for vehicle {} failed: {}", request.get_vehicle_number(), e);
                return Err(e);
            }
        };

        let location = SlotLocation::resolve(&self.layout, allocation.slot).ok_or(Error::UnknownSlot(allocation.slot))?;

        log::info!(
            "Vehicle {} successfully allocated slot {} in zone {} and area {} | Fee: Rs {}",
            request.get_vehicle_number(),
            location.slot_id,
            location.zone_id,
            location.area_id,
            allocation.fee
        );
        if allocation.cross_zone {
            log::info!("Cross-zone allocation penalty applied for vehicle {}.", request.get_vehicle_number());
        }

        Ok(ParkingReceipt {
            request_id: request.get_request_id(),
            vehicle_number: request.get_vehicle_number().clone(),
            location,
            fee: allocation.fee,
            cross_zone: allocation.cross_zone,
            notices: allocation.notices,
        })
    }

    // --- Lifecycle ---

    pub fn occupy_parking(&mut self, number: &VehicleNumber, vehicle_type: VehicleType) -> Result<SlotLocation> {
        let key = self.find_request_key(number, vehicle_type)?;
        let now = self.clock.now_in_s();
        let request = self.requests.get_mut(key).ok_or(Error::StaleRequest)?;

        request.occupy(now)?;

        let location = Self::location_of(&self.layout, request)?;
        log::info!("Vehicle {} successfully occupied slot {} in zone {} and area {}", number, location.slot_id, location.zone_id, location.area_id);
        Ok(location)
    }

    pub fn release_parking(&mut self, number: &VehicleNumber, vehicle_type: VehicleType) -> Result<ReleaseReceipt> {
        let key = self.find_request_key(number, vehicle_type)?;
        let now = self.clock.now_in_s();
        let request = self.requests.get_mut(key).ok_or(Error::StaleRequest)?;

        request.release(&mut self.layout, now)?;

        let location = Self::location_of(&self.layout, request)?;
        let duration_hours = request.get_parking_duration_hours();
        log::info!("Vehicle {} successfully released slot {} from zone {} and area {}", number, location.slot_id, location.zone_id, location.area_id);
        Ok(ReleaseReceipt { location, duration_hours })
    }

    /// Cancels the vehicle's current request.
    ///
    /// A cancellation is recorded for rollback only when the request held a
    /// slot; cancelling a request that never got one has nothing to restore.
    pub fn cancel_request(&mut self, number: &VehicleNumber, vehicle_type: VehicleType) -> Result<Option<SlotLocation>> {
        let key = self.find_request_key(number, vehicle_type)?;
        let request = self.requests.get_mut(key).ok_or(Error::StaleRequest)?;
        let held_slot = matches!(request.get_state(), RequestState::Allocated | RequestState::Occupied);

        request.cancel(&mut self.layout)?;

        if held_slot {
            self.rollback_manager.record_cancellation(key, request);
        }

        let location = request.get_allocated_slot().and_then(|slot_ref| SlotLocation::resolve(&self.layout, slot_ref));
        log::info!("Vehicle {} successfully cancelled request (slot {:?}).", number, location.map(|l| l.slot_id));
        Ok(location)
    }

    // --- Rollback ---

    /// Undoes the last `k` recorded allocations/cancellations, all or nothing.
    pub fn rollback(&mut self, k: i64) -> Result<()> {
        match self.rollback_manager.rollback_k(k, &mut self.requests, &mut self.layout) {
            Ok(()) => {
                log::info!("Successfully rolled back {} operation(s).", k);
                self.cancel_superseded_requests();
                Ok(())
            }
            Err(e) => {
                log::warn!("Rollback failed: {}", e);
                Err(e)
            }
        }
    }

    /// A restored allocation makes any later pending booking of the same
    /// vehicle redundant; those are cancelled so the vehicle keeps a single
    /// open request.
    fn cancel_superseded_requests(&mut self) {
        for key in self.requests.find_superseded_pending() {
            let Some(request) = self.requests.get_mut(key) else {
                continue;
            };
            match request.cancel(&mut self.layout) {
                Ok(()) => log::warn!(
                    "Request {} of vehicle {} cancelled: an earlier allocation was restored by rollback.",
                    request.get_request_id(),
                    request.get_vehicle_number()
                ),
                Err(e) => log::warn!("Could not cancel superseded request {}: {}", request.get_request_id(), e),
            }
        }
    }

    // --- Reporting ---

    pub fn zone_status(&self) -> Vec<ZoneStatus> {
        self.layout.get_zones().iter().map(ZoneStatus::from).collect()
    }

    /// Up to `count` requests, most recent first.
    pub fn last_operations(&self, count: usize) -> Vec<RequestSummary> {
        self.requests.iter_recent(count).map(|(_, request)| RequestSummary::from_request(request, &self.layout)).collect()
    }

    /// Every request in submission order.
    pub fn history(&self) -> Vec<RequestSummary> {
        self.requests.iter().map(|(_, request)| RequestSummary::from_request(request, &self.layout)).collect()
    }

    pub fn write_history_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for summary in self.history() {
            csv_writer.serialize(HistoryRecord::from(&summary))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    // --- Helpers ---

    fn validate_zone(&self, zone_id: ZoneId) -> Result<()> {
        if !self.config.is_valid_zone(zone_id) {
            return Err(Error::InvalidZone { zone_id, max: self.config.zone_count });
        }
        Ok(())
    }

    fn validate_area(&self, area_id: AreaId) -> Result<()> {
        if !self.config.is_valid_area(area_id) {
            return Err(Error::InvalidArea { area_id, max: self.config.areas_per_zone });
        }
        Ok(())
    }

    fn find_request_key(&self, number: &VehicleNumber, vehicle_type: VehicleType) -> Result<RequestId> {
        self.requests
            .find_current_by_vehicle(number, vehicle_type)
            .ok_or_else(|| Error::UnknownVehicle { number: number.clone(), vehicle_type })
    }

    fn location_of(layout: &ParkingLayout, request: &ParkingRequest) -> Result<SlotLocation> {
        request.get_allocated_slot().and_then(|slot_ref| SlotLocation::resolve(layout, slot_ref)).ok_or(Error::StaleRequest)
    }
}
