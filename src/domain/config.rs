use crate::api::config_dto::FacilityConfigDto;
use crate::domain::allocation::FeeSchedule;
use crate::domain::utils::id::{AreaId, ZoneId};
use crate::error::Error;

pub const DEFAULT_ZONE_COUNT: u32 = 15;
pub const DEFAULT_AREAS_PER_ZONE: u32 = 3;
pub const DEFAULT_SLOTS_PER_AREA: u32 = 20;

/// Shape and pricing of the facility, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityConfig {
    pub zone_count: u32,
    pub areas_per_zone: u32,
    pub slots_per_area: u32,
    pub fees: FeeSchedule,

    /// Undirected neighbor pairs. Informational only.
    pub adjacency: Vec<(ZoneId, ZoneId)>,
}

impl FacilityConfig {
    /// Builds a facility of the given shape where every zone neighbors its
    /// numeric predecessor and successor.
    ///
    /// Every count must be at least 1 and the slot total must fit a `SlotId`.
    pub fn with_shape(zone_count: u32, areas_per_zone: u32, slots_per_area: u32) -> Result<Self, Error> {
        for (name, value) in [("zones", zone_count), ("areasPerZone", areas_per_zone), ("slotsPerArea", slots_per_area)] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("'{}' must be at least 1", name)));
            }
        }
        if zone_count.checked_mul(areas_per_zone).and_then(|areas| areas.checked_mul(slots_per_area)).is_none() {
            return Err(Error::InvalidConfig(format!("{} x {} x {} slots exceed the slot id range", zone_count, areas_per_zone, slots_per_area)));
        }

        Ok(FacilityConfig::shaped(zone_count, areas_per_zone, slots_per_area))
    }

    fn shaped(zone_count: u32, areas_per_zone: u32, slots_per_area: u32) -> Self {
        let adjacency = (1..zone_count).map(|zone_id| (zone_id, zone_id + 1)).collect();

        FacilityConfig { zone_count, areas_per_zone, slots_per_area, fees: FeeSchedule::default(), adjacency }
    }

    pub fn total_slots(&self) -> u32 {
        self.zone_count * self.areas_per_zone * self.slots_per_area
    }

    pub fn is_valid_zone(&self, zone_id: ZoneId) -> bool {
        (1..=self.zone_count).contains(&zone_id)
    }

    pub fn is_valid_area(&self, area_id: AreaId) -> bool {
        (1..=self.areas_per_zone).contains(&area_id)
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        FacilityConfig::shaped(DEFAULT_ZONE_COUNT, DEFAULT_AREAS_PER_ZONE, DEFAULT_SLOTS_PER_AREA)
    }
}

/// Fills missing DTO fields with defaults and validates the result.
impl TryFrom<FacilityConfigDto> for FacilityConfig {
    type Error = Error;

    fn try_from(dto: FacilityConfigDto) -> Result<Self, Self::Error> {
        let zone_count = dto.zones.unwrap_or(DEFAULT_ZONE_COUNT);
        let areas_per_zone = dto.areas_per_zone.unwrap_or(DEFAULT_AREAS_PER_ZONE);
        let slots_per_area = dto.slots_per_area.unwrap_or(DEFAULT_SLOTS_PER_AREA);

        let mut config = FacilityConfig::with_shape(zone_count, areas_per_zone, slots_per_area)?;

        if let Some(fees) = dto.fees {
            let defaults = FeeSchedule::default();
            config.fees = FeeSchedule {
                car: fees.car.unwrap_or(defaults.car),
                bike: fees.bike.unwrap_or(defaults.bike),
                cross_zone_penalty: fees.cross_zone_penalty.unwrap_or(defaults.cross_zone_penalty),
            };
            config.fees.validate()?;
        }

        if let Some(neighbors) = dto.neighbors {
            let mut adjacency = Vec::new();
            for entry in neighbors {
                for neighbor in entry.neighbors {
                    if !config.is_valid_zone(entry.zone) || !config.is_valid_zone(neighbor) {
                        return Err(Error::InvalidConfig(format!("neighbor pair ({}, {}) references an unknown zone", entry.zone, neighbor)));
                    }
                    adjacency.push((entry.zone, neighbor));
                }
            }
            config.adjacency = adjacency;
        }

        Ok(config)
    }
}
