use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::domain::allocation::Fee;
use crate::domain::clock_mock::MockClock;
use crate::domain::parking_system::ParkingSystem;
use crate::domain::request::RequestState;
use crate::domain::utils::id::VehicleNumber;
use crate::domain::vehicle::VehicleType;
use crate::error::Error;

/// Seconds the simulated clock moves between two steps.
const MIN_STEP_S: i64 = 60;
const MAX_STEP_S: i64 = 1800;

/// Chance that a step undoes the most recent recorded operation.
const ROLLBACK_PROBABILITY: f64 = 0.05;

/// Counters collected over one simulated run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub bookings: usize,
    pub allocated: usize,
    pub cross_zone: usize,
    pub failed: usize,
    pub occupied: usize,
    pub released: usize,
    pub cancelled: usize,
    pub rollbacks: usize,
    pub revenue: u64,
}

impl SimulationReport {
    fn record_fee(&mut self, fee: Fee, cross_zone: bool) {
        self.allocated += 1;
        self.revenue += u64::from(fee);
        if cross_zone {
            self.cross_zone += 1;
        }
    }
}

/// Random but reproducible traffic: every step books one vehicle, then moves
/// an already booked vehicle one step further through its lifecycle.
#[derive(Debug)]
pub struct TrafficSimulation {
    rng: StdRng,
    requests: usize,
}

impl TrafficSimulation {
    pub fn new(seed: u64, requests: usize) -> Self {
        TrafficSimulation { rng: StdRng::seed_from_u64(seed), requests }
    }

    /// Drives `requests` bookings through `system`, advancing `clock` between steps.
    ///
    /// Domain failures (full facility, invalid transitions) are counted, not
    /// propagated: they are ordinary outcomes of random traffic.
    pub fn run(&mut self, system: &mut ParkingSystem, clock: &MockClock) -> SimulationReport {
        let mut report = SimulationReport::default();
        let mut fleet: Vec<(VehicleNumber, VehicleType)> = Vec::with_capacity(self.requests);
        let zone_count = system.get_config().zone_count;
        let areas_per_zone = system.get_config().areas_per_zone;

        for step in 0..self.requests {
            clock.advance(self.rng.random_range(MIN_STEP_S..=MAX_STEP_S));

            let number = VehicleNumber::new(format!("SIM-{:04}", step + 1));
            let vehicle_type = if self.rng.random_bool(0.7) { VehicleType::Car } else { VehicleType::Bike };
            let zone = self.rng.random_range(1..=zone_count);
            let area = self.rng.random_range(0..=areas_per_zone);

            report.bookings += 1;
            let outcome = match area {
                0 => system.create_parking_request(&number, vehicle_type, zone),
                area => system.create_parking_request_with_area(&number, vehicle_type, zone, area),
            };
            match outcome {
                Ok(receipt) => report.record_fee(receipt.fee, receipt.cross_zone),
                Err(e) => {
                    log::debug!("Simulated booking of {} failed: {}", number, e);
                    report.failed += 1;
                }
            }
            fleet.push((number, vehicle_type));

            self.advance_random_vehicle(system, &fleet, &mut report);

            if self.rng.random_bool(ROLLBACK_PROBABILITY) && system.rollback(1).is_ok() {
                report.rollbacks += 1;
            }
        }

        log::info!(
            "Simulation finished: {} bookings, {} allocated ({} cross-zone), {} failed, {} rollbacks, revenue Rs {}.",
            report.bookings,
            report.allocated,
            report.cross_zone,
            report.failed,
            report.rollbacks,
            report.revenue
        );

        report
    }

    /// Picks a random vehicle and applies the next natural step of its request.
    fn advance_random_vehicle(&mut self, system: &mut ParkingSystem, fleet: &[(VehicleNumber, VehicleType)], report: &mut SimulationReport) {
        let Some((number, vehicle_type)) = fleet.choose(&mut self.rng) else {
            return;
        };
        let Some(state) = system.find_request(number, *vehicle_type).map(|request| request.get_state()) else {
            return;
        };

        let outcome: Result<(), Error> = match state {
            RequestState::Allocated if self.rng.random_bool(0.2) => system.cancel_request(number, *vehicle_type).map(|_| report.cancelled += 1),
            RequestState::Allocated => system.occupy_parking(number, *vehicle_type).map(|_| report.occupied += 1),
            RequestState::Occupied => system.release_parking(number, *vehicle_type).map(|_| report.released += 1),
            RequestState::Requested => system.cancel_request(number, *vehicle_type).map(|_| report.cancelled += 1),
            RequestState::Released | RequestState::Cancelled => Ok(()),
        };

        if let Err(e) = outcome {
            log::debug!("Simulated step for {} skipped: {}", number, e);
        }
    }
}
