use crate::api::config_dto::FacilityConfigDto;
use crate::domain::clock::Clock;
use crate::domain::config::FacilityConfig;
use crate::domain::parking_system::ParkingSystem;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod cli;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads and validates a facility configuration file.
pub fn load_config(file_path: &str) -> Result<FacilityConfig> {
    let config_dto: FacilityConfigDto = parse_json_file::<FacilityConfigDto>(file_path)?;
    log::info!("Configuration file '{}' parsed successfully.", file_path);

    FacilityConfig::try_from(config_dto)
}

/// Builds the facility from `config_path`, or the built-in city when no path is given.
pub fn build_parking_system(config_path: Option<&str>, clock: Box<dyn Clock>) -> Result<ParkingSystem> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => FacilityConfig::default(),
    };

    Ok(ParkingSystem::new(config, clock))
}
