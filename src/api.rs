pub mod command;
pub mod config_dto;
pub mod response_dto;
pub mod session;
