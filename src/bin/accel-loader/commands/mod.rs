//! Command implementations

pub mod clean;
pub mod devices;
pub mod doctor;
pub mod probe;
