//! Slot search and pricing.
//!
//! The engine walks zones, areas and slots in their configured order and
//! reserves the first free slot the active policy accepts. It never changes
//! the shape of the facility; the only state it touches is slot availability
//! (through the request's own `allocate_slot` transition) and the rollback log.

use std::fmt;

use serde::Serialize;

use crate::domain::facility::layout::{ParkingLayout, SlotRef};
use crate::domain::request::{ParkingRequest, RequestState};
use crate::domain::request_store::RequestId;
use crate::domain::rollback::RollbackManager;
use crate::domain::utils::analytics::ANALYTICS_TARGET;
use crate::domain::utils::id::AreaId;
use crate::domain::vehicle::VehicleType;
use crate::error::{Error, Result};

/// Amount in whole currency units.
pub type Fee = u32;

/// Base fee per vehicle category plus the flat penalty for parking outside
/// the requested zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    pub car: Fee,
    pub bike: Fee,
    pub cross_zone_penalty: Fee,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule { car: 100, bike: 50, cross_zone_penalty: 50 }
    }
}

impl FeeSchedule {
    pub fn base_fee(&self, vehicle_type: VehicleType) -> Fee {
        match vehicle_type {
            VehicleType::Car => self.car,
            VehicleType::Bike => self.bike,
        }
    }

    /// Total for a slot outside the requested zone: base plus one penalty.
    pub fn cross_zone_fee(&self, vehicle_type: VehicleType) -> Fee {
        self.base_fee(vehicle_type).saturating_add(self.cross_zone_penalty)
    }

    /// Fails when a base fee plus the penalty does not fit a `Fee`.
    pub fn validate(&self) -> Result<()> {
        for (vehicle_type, base) in [(VehicleType::Car, self.car), (VehicleType::Bike, self.bike)] {
            if base.checked_add(self.cross_zone_penalty).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "{} fee {} plus cross-zone penalty {} exceeds {}",
                    vehicle_type,
                    base,
                    self.cross_zone_penalty,
                    Fee::MAX
                )));
            }
        }
        Ok(())
    }
}

/// Informational notes produced while searching. The engine does no I/O;
/// callers decide how to present these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationNotice {
    PreferredAreaUnavailable,
    AllocatedInOtherZone,
    FallbackToAutoAllocation,
}

impl fmt::Display for AllocationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationNotice::PreferredAreaUnavailable => write!(f, "Preferred area full, allocated in different area in same zone"),
            AllocationNotice::AllocatedInOtherZone => write!(f, "Zone full, allocated in different zone (penalty applied)"),
            AllocationNotice::FallbackToAutoAllocation => write!(f, "Could not find slot in preferred area, trying auto-allocation"),
        }
    }
}

/// A committed reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub slot: SlotRef,
    pub fee: Fee,
    pub cross_zone: bool,
    pub notices: Vec<AllocationNotice>,
}

#[derive(Debug, Clone, Copy)]
enum AreaFilter {
    Any,
    Only(AreaId),
    Except(AreaId),
}

impl AreaFilter {
    fn accepts(&self, area_id: AreaId) -> bool {
        match *self {
            AreaFilter::Any => true,
            AreaFilter::Only(preferred) => area_id == preferred,
            AreaFilter::Except(preferred) => area_id != preferred,
        }
    }
}

/// State borrowed for the duration of one allocation call.
struct Search<'a> {
    layout: &'a mut ParkingLayout,
    rollback: &'a mut RollbackManager,
    request_id: RequestId,
    request: &'a mut ParkingRequest,
}

impl<'a> Search<'a> {
    fn new(layout: &'a mut ParkingLayout, rollback: &'a mut RollbackManager, request_id: RequestId, request: &'a mut ParkingRequest) -> Result<Self> {
        if request.get_state() != RequestState::Requested {
            return Err(Error::InvalidTransition { action: "allocate", from: request.get_state() });
        }
        Ok(Search { layout, rollback, request_id, request })
    }

    fn requested_zone_index(&self) -> Option<usize> {
        self.layout.find_zone_index(self.request.get_requested_zone_id())
    }

    /// Reserves the first free slot of `zone_index` whose area passes `filter`,
    /// scanning areas in order and slots in order. Full areas are skipped.
    fn reserve_in_zone(&mut self, zone_index: usize, filter: AreaFilter) -> Option<SlotRef> {
        let zone = self.layout.get_zones().get(zone_index)?;
        let candidate = zone
            .get_areas()
            .iter()
            .enumerate()
            .filter(|(_, area)| filter.accepts(area.get_area_id()) && !area.is_full())
            .find_map(|(area_index, area)| area.first_free_slot().map(|slot_index| SlotRef::new(zone_index, area_index, slot_index)))?;

        match self.request.allocate_slot(self.layout, candidate) {
            Ok(()) => {
                self.rollback.record_allocation(self.request_id, candidate);
                Some(candidate)
            }
            Err(e) => {
                log::error!("Reserving {:?} for request {} failed after the slot was found free: {}", candidate, self.request.get_request_id(), e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    fees: FeeSchedule,
}

impl AllocationEngine {
    pub fn new(fees: FeeSchedule) -> Self {
        AllocationEngine { fees }
    }

    pub fn get_fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Allocates without an area preference.
    ///
    /// Tries the requested zone first (fee = base), then every other zone in
    /// order (fee = base + penalty). The first reserved slot wins. On failure
    /// nothing is mutated and the request stays `Requested`.
    pub fn allocate_slot(&self, layout: &mut ParkingLayout, rollback: &mut RollbackManager, request_id: RequestId, request: &mut ParkingRequest) -> Result<Allocation> {
        let mut search = Search::new(layout, rollback, request_id, request)?;
        self.allocate_auto(&mut search, Vec::new())
    }

    /// Allocates with a preferred area id.
    ///
    /// Order: requested zone + preferred area, requested zone + any other
    /// area, other zones + preferred area (penalty), then the full
    /// [`allocate_slot`](Self::allocate_slot) policy. The fallback may scan
    /// zones already scanned by the earlier steps.
    pub fn allocate_slot_with_area(
        &self,
        layout: &mut ParkingLayout,
        rollback: &mut RollbackManager,
        request_id: RequestId,
        request: &mut ParkingRequest,
        preferred_area: AreaId,
    ) -> Result<Allocation> {
        let mut search = Search::new(layout, rollback, request_id, request)?;
        let mut notices = Vec::new();
        let requested_zone = search.requested_zone_index();

        if let Some(zone_index) = requested_zone {
            if let Some(slot) = search.reserve_in_zone(zone_index, AreaFilter::Only(preferred_area)) {
                return Ok(self.commit(&search, slot, false, notices));
            }

            if let Some(slot) = search.reserve_in_zone(zone_index, AreaFilter::Except(preferred_area)) {
                notify(&mut notices, AllocationNotice::PreferredAreaUnavailable);
                return Ok(self.commit(&search, slot, false, notices));
            }
        }

        let zone_count = search.layout.zone_count();
        for zone_index in (0..zone_count).filter(|&index| Some(index) != requested_zone) {
            if let Some(slot) = search.reserve_in_zone(zone_index, AreaFilter::Only(preferred_area)) {
                notify(&mut notices, AllocationNotice::AllocatedInOtherZone);
                return Ok(self.commit(&search, slot, true, notices));
            }
        }

        notify(&mut notices, AllocationNotice::FallbackToAutoAllocation);
        self.allocate_auto(&mut search, notices)
    }

    fn allocate_auto(&self, search: &mut Search<'_>, notices: Vec<AllocationNotice>) -> Result<Allocation> {
        let requested_zone = search.requested_zone_index();

        if let Some(zone_index) = requested_zone {
            if let Some(slot) = search.reserve_in_zone(zone_index, AreaFilter::Any) {
                return Ok(self.commit(search, slot, false, notices));
            }
        }

        let zone_count = search.layout.zone_count();
        for zone_index in (0..zone_count).filter(|&index| Some(index) != requested_zone) {
            if let Some(slot) = search.reserve_in_zone(zone_index, AreaFilter::Any) {
                return Ok(self.commit(search, slot, true, notices));
            }
        }

        log::debug!("No slot reachable for request {} (requested zone {}).", search.request.get_request_id(), search.request.get_requested_zone_id());
        Err(Error::NoSlotAvailable { request_id: search.request.get_request_id() })
    }

    /// Prices a reserved slot. A cross-zone total is exactly base + penalty.
    fn commit(&self, search: &Search<'_>, slot: SlotRef, cross_zone: bool, notices: Vec<AllocationNotice>) -> Allocation {
        let vehicle_type = search.request.get_vehicle_type();
        let fee = if cross_zone { self.fees.cross_zone_fee(vehicle_type) } else { self.fees.base_fee(vehicle_type) };

        if let Some(parking_slot) = search.layout.slot(slot) {
            tracing::info!(
                target: ANALYTICS_TARGET,
                request = search.request.get_request_id(),
                vehicle = %search.request.get_vehicle_number(),
                requested_zone = search.request.get_requested_zone_id(),
                zone = parking_slot.get_zone_id(),
                area = parking_slot.get_area_id(),
                slot = parking_slot.get_slot_id(),
                fee = fee,
                cross_zone = cross_zone,
                "slot allocated"
            );
        }

        Allocation { slot, fee, cross_zone, notices }
    }
}

fn notify(notices: &mut Vec<AllocationNotice>, notice: AllocationNotice) {
    log::info!("{}", notice);
    notices.push(notice);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FacilityConfig;
    use crate::domain::request_store::RequestStore;
    use crate::domain::utils::id::{VehicleNumber, ZoneId};
    use crate::domain::vehicle::Vehicle;
    use tracing_test::traced_test;

    struct Fixture {
        engine: AllocationEngine,
        layout: ParkingLayout,
        requests: RequestStore,
        rollback: RollbackManager,
    }

    impl Fixture {
        /// 3 zones x 2 areas x 2 slots.
        fn new() -> Self {
            Fixture {
                engine: AllocationEngine::default(),
                layout: ParkingLayout::from_config(&FacilityConfig::with_shape(3, 2, 2).unwrap()),
                requests: RequestStore::new(),
                rollback: RollbackManager::new(),
            }
        }

        fn request(&mut self, vehicle_type: VehicleType, zone: ZoneId) -> RequestId {
            let id = self.requests.len() as u32 + 1;
            let vehicle = Vehicle::new(VehicleNumber::new(format!("T-{}", id)), vehicle_type, zone);
            self.requests.add(ParkingRequest::new(id, vehicle, zone, 0))
        }

        fn auto(&mut self, key: RequestId) -> Result<Allocation> {
            let request = self.requests.get_mut(key).unwrap();
            self.engine.allocate_slot(&mut self.layout, &mut self.rollback, key, request)
        }

        fn with_area(&mut self, key: RequestId, area: AreaId) -> Result<Allocation> {
            let request = self.requests.get_mut(key).unwrap();
            self.engine.allocate_slot_with_area(&mut self.layout, &mut self.rollback, key, request, area)
        }

        /// (zone id, area id) of an allocated slot.
        fn location(&self, allocation: &Allocation) -> (u32, u32) {
            let slot = self.layout.slot(allocation.slot).unwrap();
            (slot.get_zone_id(), slot.get_area_id())
        }
    }

    #[test]
    fn test_fee_schedule_tiers() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.base_fee(VehicleType::Car), 100);
        assert_eq!(fees.base_fee(VehicleType::Bike), 50);
        assert_eq!(fees.cross_zone_fee(VehicleType::Car), 150);
        assert_eq!(fees.cross_zone_fee(VehicleType::Bike), 100);
    }

    #[test]
    fn test_auto_takes_first_free_slot_in_requested_zone() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 2);

        let allocation = fx.auto(key).unwrap();

        assert_eq!(allocation.slot, SlotRef::new(1, 0, 0));
        assert_eq!(allocation.fee, 100);
        assert!(!allocation.cross_zone);
        assert!(allocation.notices.is_empty());
        assert_eq!(fx.requests.get(key).unwrap().get_state(), RequestState::Allocated);
        assert_eq!(fx.rollback.len(), 1);
    }

    #[test]
    fn test_auto_skips_full_area() {
        let mut fx = Fixture::new();
        fx.layout.fill_area(2, 1);
        let key = fx.request(VehicleType::Bike, 2);

        let allocation = fx.auto(key).unwrap();

        assert_eq!(fx.location(&allocation), (2, 2));
        assert_eq!(allocation.fee, 50);
    }

    #[test]
    fn test_auto_cross_zone_uses_first_other_zone_and_single_penalty() {
        let mut fx = Fixture::new();
        fx.layout.fill_zone(3);
        let key = fx.request(VehicleType::Bike, 3);

        let allocation = fx.auto(key).unwrap();

        assert_eq!(fx.location(&allocation), (1, 1));
        assert!(allocation.cross_zone);
        assert_eq!(allocation.fee, 100);
    }

    #[test]
    fn test_unknown_requested_zone_treats_every_zone_as_other() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 42);

        let allocation = fx.auto(key).unwrap();

        assert_eq!(fx.location(&allocation), (1, 1));
        assert!(allocation.cross_zone);
        assert_eq!(allocation.fee, 150);
    }

    #[test]
    fn test_no_slot_anywhere_leaves_request_untouched() {
        let mut fx = Fixture::new();
        for zone in 1..=3 {
            fx.layout.fill_zone(zone);
        }
        let key = fx.request(VehicleType::Car, 1);

        let result = fx.with_area(key, 1);

        assert!(matches!(result, Err(Error::NoSlotAvailable { request_id: 1 })));
        let request = fx.requests.get(key).unwrap();
        assert_eq!(request.get_state(), RequestState::Requested);
        assert_eq!(request.get_allocated_slot(), None);
        assert!(fx.rollback.is_empty());
    }

    #[test]
    fn test_allocation_requires_requested_state() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 1);
        fx.auto(key).unwrap();

        let result = fx.auto(key);

        assert!(matches!(result, Err(Error::InvalidTransition { action: "allocate", from: RequestState::Allocated })));
        assert_eq!(fx.rollback.len(), 1);
        assert_eq!(fx.layout.get_free_slots(), 11);
    }

    #[test]
    fn test_with_area_prefers_exact_area() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 1);

        let allocation = fx.with_area(key, 2).unwrap();

        assert_eq!(allocation.slot, SlotRef::new(0, 1, 0));
        assert_eq!(allocation.fee, 100);
        assert!(allocation.notices.is_empty());
    }

    #[test]
    fn test_with_area_falls_back_to_other_area_in_same_zone() {
        let mut fx = Fixture::new();
        fx.layout.fill_area(1, 2);
        let key = fx.request(VehicleType::Car, 1);

        let allocation = fx.with_area(key, 2).unwrap();

        assert_eq!(fx.location(&allocation), (1, 1));
        assert!(!allocation.cross_zone);
        assert_eq!(allocation.notices, vec![AllocationNotice::PreferredAreaUnavailable]);
    }

    #[test]
    fn test_with_area_crosses_zones_keeping_area() {
        let mut fx = Fixture::new();
        fx.layout.fill_zone(1);
        let key = fx.request(VehicleType::Car, 1);

        let allocation = fx.with_area(key, 2).unwrap();

        assert_eq!(fx.location(&allocation), (2, 2));
        assert!(allocation.cross_zone);
        assert_eq!(allocation.fee, 150);
        assert_eq!(allocation.notices, vec![AllocationNotice::AllocatedInOtherZone]);
    }

    #[test]
    fn test_with_area_final_fallback_runs_auto_policy() {
        let mut fx = Fixture::new();
        fx.layout.fill_zone(1);
        fx.layout.fill_area(2, 2);
        fx.layout.fill_area(3, 2);
        let key = fx.request(VehicleType::Bike, 1);

        let allocation = fx.with_area(key, 2).unwrap();

        assert_eq!(fx.location(&allocation), (2, 1));
        assert!(allocation.cross_zone);
        assert_eq!(allocation.fee, 100);
        assert_eq!(allocation.notices, vec![AllocationNotice::FallbackToAutoAllocation]);
        assert_eq!(fx.rollback.len(), 1);
    }

    #[test]
    fn test_with_missing_area_id_uses_other_areas_of_zone() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 3);

        let allocation = fx.with_area(key, 9).unwrap();

        assert_eq!(fx.location(&allocation), (3, 1));
        assert_eq!(allocation.notices, vec![AllocationNotice::PreferredAreaUnavailable]);
    }

    #[test]
    fn test_consecutive_requests_never_share_a_slot() {
        let mut fx = Fixture::new();
        let mut seen = Vec::new();
        for _ in 0..12 {
            let key = fx.request(VehicleType::Car, 1);
            let allocation = fx.auto(key).unwrap();
            assert!(!seen.contains(&allocation.slot));
            seen.push(allocation.slot);
        }

        let key = fx.request(VehicleType::Car, 1);
        assert!(fx.auto(key).is_err());
        assert_eq!(fx.layout.get_free_slots(), 0);
    }

    #[traced_test]
    #[test]
    fn test_allocation_emits_analytics_event() {
        let mut fx = Fixture::new();
        let key = fx.request(VehicleType::Car, 2);

        fx.auto(key).unwrap();

        assert!(logs_contain("slot allocated"));
        assert!(logs_contain("cross_zone=false"));
    }
}
