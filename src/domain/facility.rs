pub mod area;
pub mod layout;
pub mod slot;
pub mod zone;
