use std::io::{BufRead, Write};

use crate::api::command::Command;
use crate::api::response_dto::ResponseDto;
use crate::domain::parking_system::ParkingSystem;
use crate::error::Result;

/// Runs protocol commands against one facility.
#[derive(Debug)]
pub struct CommandSession {
    system: ParkingSystem,
}

impl CommandSession {
    pub fn new(system: ParkingSystem) -> Self {
        CommandSession { system }
    }

    pub fn get_system(&self) -> &ParkingSystem {
        &self.system
    }

    pub fn execute(&mut self, command: Command) -> ResponseDto {
        let system = &mut self.system;
        let response = match command {
            Command::Park { number, vehicle_type, zone, area } => {
                let receipt = match area {
                    Some(area) => system.create_parking_request_with_area(&number, vehicle_type, zone, area),
                    None => system.create_parking_request(&number, vehicle_type, zone),
                };
                receipt.map(ResponseDto::parked)
            }
            Command::Occupy { number, vehicle_type } => {
                system.occupy_parking(&number, vehicle_type).map(|slot| ResponseDto::success("Vehicle occupied slot").with_slot(Some(slot)))
            }
            Command::Release { number, vehicle_type } => system.release_parking(&number, vehicle_type).map(ResponseDto::released),
            Command::Cancel { number, vehicle_type } => system.cancel_request(&number, vehicle_type).map(|slot| ResponseDto::success("Request cancelled").with_slot(slot)),
            Command::Rollback { count } => system.rollback(count).map(|()| ResponseDto::success(format!("Rolled back {} operation(s)", count))),
            Command::Status => Ok(ResponseDto::success("Zone status").with_zones(system.zone_status())),
            Command::History => {
                let history = system.last_operations(system.get_requests().len());
                Ok(ResponseDto::success(format!("{} request(s)", history.len())).with_history(history))
            }
        };

        response.unwrap_or_else(|e| ResponseDto::error(&e))
    }

    /// Parses and executes one line. A malformed line yields an error response.
    pub fn handle_line(&mut self, line: &str) -> ResponseDto {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => {
                log::warn!("Rejected command: {}", e);
                ResponseDto::error(&e)
            }
        }
    }

    /// Answers every non-empty input line with one JSON line until EOF or `EXIT`.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("EXIT") {
                break;
            }

            let response = self.handle_line(trimmed);
            serde_json::to_writer(&mut output, &response)?;
            writeln!(output)?;
            output.flush()?;
        }

        log::info!("Command session closed.");
        Ok(())
    }
}
