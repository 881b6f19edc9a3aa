use serde::Serialize;

use crate::domain::utils::id::{AreaId, SlotId, ZoneId};

/// A single parking space. The availability flag is the only record of
/// whether the space is taken.
#[derive(Debug, Clone, Serialize)]
pub struct ParkingSlot {
    slot_id: SlotId,
    zone_id: ZoneId,
    area_id: AreaId,
    available: bool,
}

impl ParkingSlot {
    pub fn new(slot_id: SlotId, zone_id: ZoneId, area_id: AreaId) -> Self {
        ParkingSlot { slot_id, zone_id, area_id, available: true }
    }

    pub fn get_slot_id(&self) -> SlotId {
        self.slot_id
    }

    pub fn get_zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn get_area_id(&self) -> AreaId {
        self.area_id
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn mark_occupied(&mut self) {
        if !self.available {
            log::error!("Slot {} (zone {}, area {}) was marked occupied twice --> Signals an error in the implementation.", self.slot_id, self.zone_id, self.area_id);
        }
        self.available = false;
    }

    /// Freeing an already free slot is a no-op; rollback relies on that.
    pub fn mark_free(&mut self) {
        self.available = true;
    }
}
