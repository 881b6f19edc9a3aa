use serde::Serialize;

use crate::domain::config::FacilityConfig;
use crate::domain::facility::area::ParkingArea;
use crate::domain::facility::slot::ParkingSlot;
use crate::domain::facility::zone::Zone;
use crate::domain::utils::id::{AreaId, AreaName, ZoneId, ZoneName};

/// Non-owning handle to a slot: its position inside the zone/area/slot tree.
///
/// Zone, area and slot counts never change after the layout is built, so a
/// handle stays valid for the lifetime of the layout it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotRef {
    pub zone_index: usize,
    pub area_index: usize,
    pub slot_index: usize,
}

impl SlotRef {
    pub fn new(zone_index: usize, area_index: usize, slot_index: usize) -> Self {
        SlotRef { zone_index, area_index, slot_index }
    }
}

/// The ordered zones of the facility. Owns every zone, area and slot.
#[derive(Debug, Clone, Serialize)]
pub struct ParkingLayout {
    zones: Vec<Zone>,
}

impl ParkingLayout {
    pub fn new(zones: Vec<Zone>) -> Self {
        ParkingLayout { zones }
    }

    /// Builds the city: `zone_count` zones named `Zone-<n>`, each with
    /// `areas_per_zone` areas of `slots_per_area` slots. Slot ids run from 1
    /// across the whole facility.
    pub fn from_config(config: &FacilityConfig) -> Self {
        let mut slot_id_counter = 1;
        let mut zones = Vec::with_capacity(config.zone_count as usize);

        for zone_id in 1..=config.zone_count {
            let mut areas = Vec::with_capacity(config.areas_per_zone as usize);

            for area_id in 1..=config.areas_per_zone {
                let slots = (0..config.slots_per_area)
                    .map(|_| {
                        let slot = ParkingSlot::new(slot_id_counter, zone_id, area_id);
                        slot_id_counter += 1;
                        slot
                    })
                    .collect();

                areas.push(ParkingArea::new(area_id, AreaName::new(format!("Area-{}", area_id)), zone_id, slots));
            }

            zones.push(Zone::new(zone_id, ZoneName::new(format!("Zone-{}", zone_id)), areas));
        }

        let mut layout = ParkingLayout::new(zones);
        for &(a, b) in &config.adjacency {
            layout.connect_zones(a, b);
        }

        log::debug!("Facility initialized with {} zones and {} slots.", layout.zone_count(), layout.get_total_slots());

        layout
    }

    fn connect_zones(&mut self, a: ZoneId, b: ZoneId) {
        if let Some(zone) = self.find_zone_mut(a) {
            zone.add_neighbor_zone(b);
        }
        if let Some(zone) = self.find_zone_mut(b) {
            zone.add_neighbor_zone(a);
        }
    }

    pub fn get_zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn find_zone_index(&self, zone_id: ZoneId) -> Option<usize> {
        self.zones.iter().position(|zone| zone.get_zone_id() == zone_id)
    }

    pub fn find_zone(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.get_zone_id() == zone_id)
    }

    fn find_zone_mut(&mut self, zone_id: ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|zone| zone.get_zone_id() == zone_id)
    }

    pub fn slot(&self, slot_ref: SlotRef) -> Option<&ParkingSlot> {
        self.zones.get(slot_ref.zone_index)?.get_areas().get(slot_ref.area_index)?.get_slots().get(slot_ref.slot_index)
    }

    pub fn slot_mut(&mut self, slot_ref: SlotRef) -> Option<&mut ParkingSlot> {
        self.zones.get_mut(slot_ref.zone_index)?.get_area_mut(slot_ref.area_index)?.get_slot_mut(slot_ref.slot_index)
    }

    pub fn get_total_slots(&self) -> usize {
        self.zones.iter().map(Zone::get_total_slots).sum()
    }

    pub fn get_free_slots(&self) -> usize {
        self.zones.iter().map(Zone::get_free_slots).sum()
    }

    /// Marks every slot of the given area occupied. Used to stage scenarios.
    #[cfg(test)]
    pub(crate) fn fill_area(&mut self, zone_id: ZoneId, area_id: AreaId) {
        let Some(zone) = self.find_zone_mut(zone_id) else {
            return;
        };
        let Some(area_index) = zone.find_area_index(area_id) else {
            return;
        };
        if let Some(area) = zone.get_area_mut(area_index) {
            for slot_index in 0..area.get_total_slots() {
                if let Some(slot) = area.get_slot_mut(slot_index) {
                    if slot.is_available() {
                        slot.mark_occupied();
                    }
                }
            }
        }
    }

    /// Marks every slot of the given zone occupied. Used to stage scenarios.
    #[cfg(test)]
    pub(crate) fn fill_zone(&mut self, zone_id: ZoneId) {
        let area_ids: Vec<AreaId> = match self.find_zone(zone_id) {
            Some(zone) => zone.get_areas().iter().map(ParkingArea::get_area_id).collect(),
            None => return,
        };
        for area_id in area_ids {
            self.fill_area(zone_id, area_id);
        }
    }
}
