use thiserror::Error;

use crate::domain::facility::layout::SlotRef;
use crate::domain::request::RequestState;
use crate::domain::utils::id::{AreaId, RequestNumber, SlotId, VehicleNumber, ZoneId};
use crate::domain::vehicle::VehicleType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse facility configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write request history: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid facility configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid zone {zone_id}. Must be between 1-{max}")]
    InvalidZone { zone_id: ZoneId, max: ZoneId },

    #[error("Invalid parking area {area_id}. Must be between 1-{max}")]
    InvalidArea { area_id: AreaId, max: AreaId },

    #[error("No slots available for request {request_id}")]
    NoSlotAvailable { request_id: RequestNumber },

    #[error("Cannot {action} request in state {from}")]
    InvalidTransition { action: &'static str, from: RequestState },

    #[error("Slot {slot_id} is not available")]
    SlotUnavailable { slot_id: SlotId },

    #[error("Slot reference {0:?} does not exist in this facility")]
    UnknownSlot(SlotRef),

    #[error("Vehicle {number} ({vehicle_type}) already has an active request")]
    DuplicateVehicle { number: VehicleNumber, vehicle_type: VehicleType },

    #[error("Vehicle {number} ({vehicle_type}) is not in the system")]
    UnknownVehicle { number: VehicleNumber, vehicle_type: VehicleType },

    #[error("Request handle no longer resolves to a request")]
    StaleRequest,

    #[error("Rollback count must be positive, got {0}")]
    InvalidRollbackCount(i64),

    #[error("Not enough operations to rollback: requested {requested}, recorded {available}")]
    RollbackUnderflow { requested: usize, available: usize },

    #[error("Malformed command '{0}'")]
    MalformedCommand(String),
}

pub type Result<T> = std::result::Result<T, Error>;
