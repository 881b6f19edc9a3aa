pub mod allocation;
pub mod clock;
pub mod clock_mock;
pub mod config;
pub mod facility;
pub mod parking_system;
pub mod report;
pub mod request;
pub mod request_store;
pub mod rollback;
pub mod simulation;
pub mod utils;
pub mod vehicle;
