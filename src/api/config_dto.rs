use serde::Deserialize;

/// JSON shape of a facility configuration file. Every field is optional and
/// falls back to the built-in city layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityConfigDto {
    pub zones: Option<u32>,
    pub areas_per_zone: Option<u32>,
    pub slots_per_area: Option<u32>,
    pub fees: Option<FeeScheduleDto>,
    pub neighbors: Option<Vec<NeighborDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeScheduleDto {
    pub car: Option<u32>,
    pub bike: Option<u32>,
    pub cross_zone_penalty: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborDto {
    pub zone: u32,
    pub neighbors: Vec<u32>,
}
