use std::fmt;

use serde::Serialize;

use crate::domain::utils::id::{VehicleNumber, ZoneId};

/// Vehicle category. Decides the base fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VehicleType {
    /// Four-wheel category.
    Car,
    /// Two-wheel category.
    Bike,
}

impl VehicleType {
    /// Operator menu / command code: `1` is a car, `2` a bike.
    pub fn from_code(code: u32) -> Option<VehicleType> {
        match code {
            1 => Some(VehicleType::Car),
            2 => Some(VehicleType::Bike),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            VehicleType::Car => 1,
            VehicleType::Bike => 2,
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Car => write!(f, "Car"),
            VehicleType::Bike => write!(f, "Bike"),
        }
    }
}

/// Immutable vehicle record. Two records describe the same vehicle when
/// number and type both match.
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    vehicle_number: VehicleNumber,
    vehicle_type: VehicleType,
    preferred_zone_id: ZoneId,
}

impl Vehicle {
    pub fn new(vehicle_number: VehicleNumber, vehicle_type: VehicleType, preferred_zone_id: ZoneId) -> Self {
        Vehicle { vehicle_number, vehicle_type, preferred_zone_id }
    }

    pub fn get_vehicle_number(&self) -> &VehicleNumber {
        &self.vehicle_number
    }

    pub fn get_vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    pub fn get_preferred_zone_id(&self) -> ZoneId {
        self.preferred_zone_id
    }

    pub fn matches(&self, number: &VehicleNumber, vehicle_type: VehicleType) -> bool {
        &self.vehicle_number == number && self.vehicle_type == vehicle_type
    }

    pub fn is_same_vehicle(&self, other: &Vehicle) -> bool {
        self.matches(&other.vehicle_number, other.vehicle_type)
    }
}
