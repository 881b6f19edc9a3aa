use serde::Serialize;

use crate::domain::allocation::{AllocationNotice, Fee};
use crate::domain::facility::layout::{ParkingLayout, SlotRef};
use crate::domain::facility::zone::Zone;
use crate::domain::request::{ParkingRequest, RequestState};
use crate::domain::utils::id::{AreaId, RequestNumber, SlotId, VehicleNumber, ZoneId, ZoneName};
use crate::domain::vehicle::VehicleType;

/// Operator-facing address of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLocation {
    pub slot_id: SlotId,
    pub zone_id: ZoneId,
    pub area_id: AreaId,
}

impl SlotLocation {
    pub fn resolve(layout: &ParkingLayout, slot_ref: SlotRef) -> Option<SlotLocation> {
        layout.slot(slot_ref).map(|slot| SlotLocation { slot_id: slot.get_slot_id(), zone_id: slot.get_zone_id(), area_id: slot.get_area_id() })
    }
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingReceipt {
    pub request_id: RequestNumber,
    pub vehicle_number: VehicleNumber,
    pub location: SlotLocation,
    pub fee: Fee,
    pub cross_zone: bool,
    pub notices: Vec<AllocationNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReceipt {
    pub location: SlotLocation,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    pub zone_id: ZoneId,
    pub zone_name: ZoneName,
    pub total_slots: usize,
    pub occupied_slots: usize,
    pub free_slots: usize,
    pub utilization: f64,
    pub neighbors: Vec<ZoneId>,
}

impl From<&Zone> for ZoneStatus {
    fn from(zone: &Zone) -> Self {
        ZoneStatus {
            zone_id: zone.get_zone_id(),
            zone_name: zone.get_zone_name().clone(),
            total_slots: zone.get_total_slots(),
            occupied_slots: zone.get_occupied_slots(),
            free_slots: zone.get_free_slots(),
            utilization: zone.get_utilization_rate(),
            neighbors: zone.get_neighbor_zones(),
        }
    }
}

/// Snapshot of one request for history views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub request_id: RequestNumber,
    pub vehicle_number: VehicleNumber,
    pub vehicle_type: VehicleType,
    pub requested_zone_id: ZoneId,
    pub state: RequestState,
    pub location: Option<SlotLocation>,
    pub requested_at: i64,
    pub occupied_at: Option<i64>,
    pub released_at: Option<i64>,
    pub duration_hours: f64,
}

impl RequestSummary {
    pub fn from_request(request: &ParkingRequest, layout: &ParkingLayout) -> Self {
        RequestSummary {
            request_id: request.get_request_id(),
            vehicle_number: request.get_vehicle_number().clone(),
            vehicle_type: request.get_vehicle_type(),
            requested_zone_id: request.get_requested_zone_id(),
            state: request.get_state(),
            location: request.get_allocated_slot().and_then(|slot_ref| SlotLocation::resolve(layout, slot_ref)),
            requested_at: request.get_request_time(),
            occupied_at: request.get_occupy_time(),
            released_at: request.get_release_time(),
            duration_hours: request.get_parking_duration_hours(),
        }
    }
}

/// Flat CSV row; the csv writer cannot nest `SlotLocation`.
#[derive(Debug, Serialize)]
pub struct HistoryRecord {
    pub request_id: RequestNumber,
    pub vehicle_number: String,
    pub vehicle_type: VehicleType,
    pub requested_zone: ZoneId,
    pub state: RequestState,
    pub slot: Option<SlotId>,
    pub zone: Option<ZoneId>,
    pub area: Option<AreaId>,
    pub requested_at: i64,
    pub occupied_at: Option<i64>,
    pub released_at: Option<i64>,
    pub duration_hours: f64,
}

impl From<&RequestSummary> for HistoryRecord {
    fn from(summary: &RequestSummary) -> Self {
        HistoryRecord {
            request_id: summary.request_id,
            vehicle_number: summary.vehicle_number.to_string(),
            vehicle_type: summary.vehicle_type,
            requested_zone: summary.requested_zone_id,
            state: summary.state,
            slot: summary.location.map(|location| location.slot_id),
            zone: summary.location.map(|location| location.zone_id),
            area: summary.location.map(|location| location.area_id),
            requested_at: summary.requested_at,
            occupied_at: summary.occupied_at,
            released_at: summary.released_at,
            duration_hours: summary.duration_hours,
        }
    }
}
