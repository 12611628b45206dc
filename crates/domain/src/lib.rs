//! Domain layer for Weathervane
//!
//! Locations, readings, forecasts, thresholds and alerts. Nothing here
//! performs I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
