use serde::Serialize;

use crate::domain::report::{ParkingReceipt, ReleaseReceipt, RequestSummary, SlotLocation, ZoneStatus};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDto {
    Success,
    Error,
}

/// One JSON line answering one protocol command. Only the payload that
/// belongs to the command is serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDto {
    pub result: ResultDto,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ParkingReceipt>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneStatus>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<RequestSummary>>,
}

impl ResponseDto {
    pub fn success(message: impl Into<String>) -> Self {
        ResponseDto { result: ResultDto::Success, message: message.into(), receipt: None, slot: None, duration_hours: None, zones: None, history: None }
    }

    pub fn error(error: &Error) -> Self {
        ResponseDto { result: ResultDto::Error, ..ResponseDto::success(error.to_string()) }
    }

    pub fn parked(receipt: ParkingReceipt) -> Self {
        let message = format!("Allocated slot {} in zone {}, area {}", receipt.location.slot_id, receipt.location.zone_id, receipt.location.area_id);
        ResponseDto { slot: Some(receipt.location), receipt: Some(receipt), ..ResponseDto::success(message) }
    }

    pub fn released(receipt: ReleaseReceipt) -> Self {
        ResponseDto { slot: Some(receipt.location), duration_hours: Some(receipt.duration_hours), ..ResponseDto::success("Vehicle released") }
    }

    pub fn with_slot(mut self, slot: Option<SlotLocation>) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_zones(mut self, zones: Vec<ZoneStatus>) -> Self {
        self.zones = Some(zones);
        self
    }

    pub fn with_history(mut self, history: Vec<RequestSummary>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultDto::Success
    }
}
