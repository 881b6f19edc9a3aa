use serde::Serialize;

use crate::domain::facility::slot::ParkingSlot;
use crate::domain::utils::id::{AreaId, AreaName, ZoneId};

/// A subdivision of a zone. Owns its slots; the slot count is fixed once the
/// area is built.
#[derive(Debug, Clone, Serialize)]
pub struct ParkingArea {
    area_id: AreaId,
    area_name: AreaName,
    zone_id: ZoneId,
    slots: Vec<ParkingSlot>,
}

impl ParkingArea {
    pub fn new(area_id: AreaId, area_name: AreaName, zone_id: ZoneId, slots: Vec<ParkingSlot>) -> Self {
        ParkingArea { area_id, area_name, zone_id, slots }
    }

    pub fn get_area_id(&self) -> AreaId {
        self.area_id
    }

    pub fn get_area_name(&self) -> &AreaName {
        &self.area_name
    }

    pub fn get_zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn get_slots(&self) -> &[ParkingSlot] {
        &self.slots
    }

    pub(crate) fn get_slot_mut(&mut self, slot_index: usize) -> Option<&mut ParkingSlot> {
        self.slots.get_mut(slot_index)
    }

    pub fn get_total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn get_occupied_slots(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_available()).count()
    }

    pub fn get_free_slots(&self) -> usize {
        self.get_total_slots() - self.get_occupied_slots()
    }

    pub fn is_full(&self) -> bool {
        self.get_free_slots() == 0
    }

    /// Position of the first available slot in slot order.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(ParkingSlot::is_available)
    }
}
