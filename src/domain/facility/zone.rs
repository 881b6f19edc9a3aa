use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::facility::area::ParkingArea;
use crate::domain::utils::id::{AreaId, ZoneId, ZoneName};

/// Top-level partition of the facility.
///
/// The neighbor set is informational only: allocation never routes through it.
#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    zone_id: ZoneId,
    zone_name: ZoneName,
    areas: Vec<ParkingArea>,
    neighbor_zones: BTreeSet<ZoneId>,
}

impl Zone {
    pub fn new(zone_id: ZoneId, zone_name: ZoneName, areas: Vec<ParkingArea>) -> Self {
        Zone { zone_id, zone_name, areas, neighbor_zones: BTreeSet::new() }
    }

    pub fn get_zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn get_zone_name(&self) -> &ZoneName {
        &self.zone_name
    }

    pub fn get_areas(&self) -> &[ParkingArea] {
        &self.areas
    }

    pub(crate) fn get_area_mut(&mut self, area_index: usize) -> Option<&mut ParkingArea> {
        self.areas.get_mut(area_index)
    }

    pub fn get_total_parking_areas(&self) -> usize {
        self.areas.len()
    }

    /// Position of the first area carrying `area_id`.
    pub fn find_area_index(&self, area_id: AreaId) -> Option<usize> {
        self.areas.iter().position(|area| area.get_area_id() == area_id)
    }

    // --- Adjacency ---

    /// Registers `zone_id` as a neighbor. A zone is never its own neighbor.
    pub fn add_neighbor_zone(&mut self, zone_id: ZoneId) {
        if zone_id != self.zone_id {
            self.neighbor_zones.insert(zone_id);
        }
    }

    pub fn is_neighbor_zone(&self, zone_id: ZoneId) -> bool {
        self.neighbor_zones.contains(&zone_id)
    }

    pub fn get_neighbor_zones(&self) -> Vec<ZoneId> {
        self.neighbor_zones.iter().copied().collect()
    }

    // --- Slot statistics ---

    pub fn get_total_slots(&self) -> usize {
        self.areas.iter().map(ParkingArea::get_total_slots).sum()
    }

    pub fn get_occupied_slots(&self) -> usize {
        self.areas.iter().map(ParkingArea::get_occupied_slots).sum()
    }

    pub fn get_free_slots(&self) -> usize {
        self.get_total_slots() - self.get_occupied_slots()
    }

    pub fn is_zone_full(&self) -> bool {
        self.get_free_slots() == 0
    }

    /// Occupied share of all slots in `[0, 1]`; an empty zone reports 0.
    pub fn get_utilization_rate(&self) -> f64 {
        let total = self.get_total_slots();
        if total == 0 {
            return 0.0;
        }

        self.get_occupied_slots() as f64 / total as f64
    }
}
