pub mod analytics;
pub mod id;
