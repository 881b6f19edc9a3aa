pub mod args;
pub mod console;
