use std::str::FromStr;

use crate::domain::utils::id::{AreaId, VehicleNumber, ZoneId};
use crate::domain::vehicle::VehicleType;
use crate::error::{Error, Result};

/// One line of the command protocol.
///
/// ```text
/// PARK <plate> <type 1=car|2=bike> <zone> <area 0=auto>
/// OCCUPY <plate> <type>
/// RELEASE <plate> <type>
/// CANCEL <plate> <type>
/// ROLLBACK <k>
/// STATUS
/// HISTORY
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Park { number: VehicleNumber, vehicle_type: VehicleType, zone: ZoneId, area: Option<AreaId> },
    Occupy { number: VehicleNumber, vehicle_type: VehicleType },
    Release { number: VehicleNumber, vehicle_type: VehicleType },
    Cancel { number: VehicleNumber, vehicle_type: VehicleType },
    Rollback { count: i64 },
    Status,
    History,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedCommand(line.trim().to_string());
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (keyword, args) = tokens.split_first().ok_or_else(malformed)?;

        let command = match (keyword.to_ascii_uppercase().as_str(), args) {
            ("PARK", [plate, code, zone, area]) => {
                let area: AreaId = parse(area).ok_or_else(malformed)?;
                Command::Park {
                    number: VehicleNumber::new(*plate),
                    vehicle_type: vehicle_type(code).ok_or_else(malformed)?,
                    zone: parse(zone).ok_or_else(malformed)?,
                    area: (area != 0).then_some(area),
                }
            }
            ("OCCUPY", [plate, code]) => Command::Occupy { number: VehicleNumber::new(*plate), vehicle_type: vehicle_type(code).ok_or_else(malformed)? },
            ("RELEASE", [plate, code]) => Command::Release { number: VehicleNumber::new(*plate), vehicle_type: vehicle_type(code).ok_or_else(malformed)? },
            ("CANCEL", [plate, code]) => Command::Cancel { number: VehicleNumber::new(*plate), vehicle_type: vehicle_type(code).ok_or_else(malformed)? },
            ("ROLLBACK", [count]) => Command::Rollback { count: parse(count).ok_or_else(malformed)? },
            ("STATUS", []) => Command::Status,
            ("HISTORY", []) => Command::History,
            _ => return Err(malformed()),
        };

        Ok(command)
    }
}

fn parse<T: FromStr>(token: &str) -> Option<T> {
    token.parse().ok()
}

fn vehicle_type(token: &str) -> Option<VehicleType> {
    parse(token).and_then(VehicleType::from_code)
}
