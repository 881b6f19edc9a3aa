use std::collections::VecDeque;
use std::io::{BufRead, Write};

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::domain::parking_system::ParkingSystem;
use crate::domain::report::{ParkingReceipt, RequestSummary};
use crate::domain::request::RequestState;
use crate::domain::utils::id::{AreaId, VehicleNumber, ZoneId};
use crate::domain::vehicle::VehicleType;
use crate::error::Result;

const LAST_OPERATIONS: usize = 5;

/// Numbered operator menu. Input is read token by token, so answers may be
/// given one per line or several on one line.
pub struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output, pending: VecDeque::new() }
    }

    /// Runs the menu until `0` or end of input.
    pub fn run(&mut self, system: &mut ParkingSystem) -> Result<()> {
        loop {
            self.show_menu()?;
            let Some(choice) = self.next_token()? else {
                break;
            };

            let keep_going = match choice.as_str() {
                "1" => self.create_request(system, false)?,
                "2" => self.create_request(system, true)?,
                "3" => self.occupy(system)?,
                "4" => self.release(system)?,
                "5" => self.cancel(system)?,
                "6" => self.show_zone_status(system).map(|()| true)?,
                "7" => self.show_last_operations(system).map(|()| true)?,
                "8" => self.rollback(system)?,
                "0" => {
                    writeln!(self.output, "Exiting system. Goodbye!")?;
                    break;
                }
                _ => {
                    writeln!(self.output, "{}", "Invalid option. Please try again.".red())?;
                    true
                }
            };

            if !keep_going {
                break;
            }
        }

        self.output.flush()?;
        Ok(())
    }

    // --- Menu actions ---
    //
    // Each action returns `Ok(false)` when input ran out mid-dialogue.

    fn create_request(&mut self, system: &mut ParkingSystem, with_area: bool) -> Result<bool> {
        let Some((number, vehicle_type)) = self.read_vehicle()? else {
            return Ok(false);
        };
        let Some(vehicle_type) = vehicle_type else {
            return Ok(true);
        };

        let zone_count = system.get_config().zone_count;
        let Some(zone) = self.prompt(&format!("Enter preferred zone (1 - {}): ", zone_count))? else {
            return Ok(false);
        };
        let Ok(zone) = zone.parse::<ZoneId>() else {
            writeln!(self.output, "{}", format!("Invalid zone selected. Must be between 1-{}.", zone_count).red())?;
            return Ok(true);
        };

        let outcome = if with_area {
            let Some(area) = self.read_area(system.get_config().areas_per_zone)? else {
                return Ok(false);
            };
            system.create_parking_request_with_area(&number, vehicle_type, zone, area)
        } else {
            system.create_parking_request(&number, vehicle_type, zone)
        };

        match outcome {
            Ok(receipt) => self.print_receipt(&receipt)?,
            Err(e) => writeln!(self.output, "{}", e.to_string().red())?,
        }
        Ok(true)
    }

    fn occupy(&mut self, system: &mut ParkingSystem) -> Result<bool> {
        let Some((number, vehicle_type)) = self.read_vehicle()? else {
            return Ok(false);
        };
        if let Some(vehicle_type) = vehicle_type {
            match system.occupy_parking(&number, vehicle_type) {
                Ok(slot) => writeln!(
                    self.output,
                    "{}",
                    format!("Vehicle {} successfully occupied slot {} in zone {} and area {}", number, slot.slot_id, slot.zone_id, slot.area_id).green()
                )?,
                Err(e) => writeln!(self.output, "{}", e.to_string().red())?,
            }
        }
        Ok(true)
    }

    fn release(&mut self, system: &mut ParkingSystem) -> Result<bool> {
        let Some((number, vehicle_type)) = self.read_vehicle()? else {
            return Ok(false);
        };
        if let Some(vehicle_type) = vehicle_type {
            match system.release_parking(&number, vehicle_type) {
                Ok(receipt) => {
                    let slot = receipt.location;
                    writeln!(
                        self.output,
                        "{}",
                        format!("Vehicle {} successfully released slot {} from zone {} and area {}", number, slot.slot_id, slot.zone_id, slot.area_id).green()
                    )?;
                    writeln!(self.output, "Parking duration: {}", format_duration(receipt.duration_hours))?;
                }
                Err(e) => writeln!(self.output, "{}", e.to_string().red())?,
            }
        }
        Ok(true)
    }

    fn cancel(&mut self, system: &mut ParkingSystem) -> Result<bool> {
        let Some((number, vehicle_type)) = self.read_vehicle()? else {
            return Ok(false);
        };
        if let Some(vehicle_type) = vehicle_type {
            match system.cancel_request(&number, vehicle_type) {
                Ok(_) => writeln!(self.output, "{}", format!("Vehicle {} successfully cancelled request", number).green())?,
                Err(e) => writeln!(self.output, "{}", e.to_string().red())?,
            }
        }
        Ok(true)
    }

    fn rollback(&mut self, system: &mut ParkingSystem) -> Result<bool> {
        let Some(count) = self.prompt("Enter number of operations to rollback: ")? else {
            return Ok(false);
        };

        match count.parse::<i64>().map(|k| (k, system.rollback(k))) {
            Ok((k, Ok(()))) => writeln!(self.output, "{}", format!("Successfully rolled back {} operation(s)", k).green())?,
            Ok((_, Err(e))) => writeln!(self.output, "{}", format!("Rollback failed - {}", e).red())?,
            Err(_) => writeln!(self.output, "{}", "Rollback failed - not a number".red())?,
        }
        Ok(true)
    }

    // --- Views ---

    fn show_zone_status(&mut self, system: &ParkingSystem) -> Result<()> {
        writeln!(self.output, "\n========== ZONE STATUS ==========")?;
        for zone in system.zone_status() {
            writeln!(
                self.output,
                "{} | Total: {} | Free: {} | Utilization: {:.1}%",
                zone.zone_name,
                zone.total_slots,
                zone.free_slots,
                zone.utilization * 100.0
            )?;
        }
        writeln!(self.output, "=================================")?;
        Ok(())
    }

    fn show_last_operations(&mut self, system: &ParkingSystem) -> Result<()> {
        writeln!(self.output, "\n========== LAST {} OPERATIONS ==========", LAST_OPERATIONS)?;

        let operations = system.last_operations(LAST_OPERATIONS);
        if operations.is_empty() {
            writeln!(self.output, "No operations recorded yet.")?;
            return Ok(());
        }

        for (index, operation) in operations.iter().enumerate() {
            writeln!(self.output, "Operation #{}:", index + 1)?;
            self.print_summary(operation)?;
            writeln!(self.output, "-----------------------------------")?;
        }
        Ok(())
    }

    fn print_summary(&mut self, summary: &RequestSummary) -> Result<()> {
        writeln!(self.output, "  Vehicle: {}", summary.vehicle_number)?;
        writeln!(self.output, "  Type: {}", summary.vehicle_type)?;
        writeln!(self.output, "  Status: {}", summary.state)?;
        if let Some(slot) = summary.location {
            writeln!(self.output, "  Slot: {} (Zone {}, Area {})", slot.slot_id, slot.zone_id, slot.area_id)?;
        }
        writeln!(self.output, "  Requested: {}", format_timestamp(summary.requested_at))?;
        if summary.state == RequestState::Released {
            writeln!(self.output, "  Duration: {}", format_duration(summary.duration_hours))?;
        }
        if let Some(occupied_at) = summary.occupied_at {
            writeln!(self.output, "  Occupied: {}", format_timestamp(occupied_at))?;
        }
        if let Some(released_at) = summary.released_at {
            writeln!(self.output, "  Released: {}", format_timestamp(released_at))?;
        }
        Ok(())
    }

    fn print_receipt(&mut self, receipt: &ParkingReceipt) -> Result<()> {
        for notice in &receipt.notices {
            writeln!(self.output, "{}", notice.to_string().yellow())?;
        }
        writeln!(
            self.output,
            "{}",
            format!(
                "Vehicle {} successfully allocated slot {} in zone {} and area {}",
                receipt.vehicle_number, receipt.location.slot_id, receipt.location.zone_id, receipt.location.area_id
            )
            .green()
        )?;
        writeln!(self.output, "{}", "Request created successfully".green())?;
        writeln!(self.output, "Allocated Fee: Rs {}", receipt.fee)?;
        if receipt.cross_zone {
            writeln!(self.output, "{}", "Cross-zone allocation penalty applied".yellow())?;
        }
        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.output, "\n========== SMART PARKING SYSTEM ==========")?;
        writeln!(self.output, "1. Create Parking Request (Auto Allocation)")?;
        writeln!(self.output, "2. Create Parking Request (Select Zone & Area)")?;
        writeln!(self.output, "3. Occupy Parking")?;
        writeln!(self.output, "4. Release Parking")?;
        writeln!(self.output, "5. Cancel Parking Request")?;
        writeln!(self.output, "6. View Zone Status")?;
        writeln!(self.output, "7. View Last {} Operations", LAST_OPERATIONS)?;
        writeln!(self.output, "8. Rollback Last Operation(s)")?;
        writeln!(self.output, "0. Exit")?;
        writeln!(self.output, "==========================================")?;
        write!(self.output, "Enter choice: ")?;
        self.output.flush()?;
        Ok(())
    }

    // --- Input ---

    /// Reads a vehicle number and type. The inner `None` marks an invalid
    /// type code, which has already been reported.
    fn read_vehicle(&mut self) -> Result<Option<(VehicleNumber, Option<VehicleType>)>> {
        let Some(number) = self.prompt("Enter vehicle number: ")? else {
            return Ok(None);
        };
        let Some(code) = self.prompt("Select Vehicle Type:\n1. Car\n2. Bike\nChoice: ")? else {
            return Ok(None);
        };

        let vehicle_type = code.parse::<u32>().ok().and_then(VehicleType::from_code);
        if vehicle_type.is_none() {
            writeln!(self.output, "{}", "Invalid vehicle type selected!".red())?;
        }
        Ok(Some((VehicleNumber::new(number), vehicle_type)))
    }

    /// Asks until an area in `1..=areas_per_zone` is given.
    fn read_area(&mut self, areas_per_zone: AreaId) -> Result<Option<AreaId>> {
        loop {
            let Some(answer) = self.prompt(&format!("Select Parking Area (1-{}): ", areas_per_zone))? else {
                return Ok(None);
            };
            match answer.parse::<AreaId>() {
                Ok(area) if (1..=areas_per_zone).contains(&area) => return Ok(Some(area)),
                _ => writeln!(self.output, "{}", format!("Invalid area! Please enter a value between 1 and {}.", areas_per_zone).red())?,
            }
        }
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.next_token()
    }

    fn next_token(&mut self) -> Result<Option<String>> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&Local).format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// `1.5` hours -> `1.50 hours (1h 30m 0s)`.
fn format_duration(hours: f64) -> String {
    let total_seconds = (hours * 3600.0).round() as i64;
    let (h, m, s) = (total_seconds / 3600, (total_seconds % 3600) / 60, total_seconds % 60);

    let mut parts = String::new();
    if h > 0 {
        parts.push_str(&format!("{}h ", h));
    }
    if m > 0 {
        parts.push_str(&format!("{}m ", m));
    }
    parts.push_str(&format!("{}s", s));

    format!("{:.2} hours ({})", hours, parts)
}
