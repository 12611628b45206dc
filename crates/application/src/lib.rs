//! Application layer - Use cases and orchestration
//!
//! Defines the ports the pipeline depends on and the services that drive
//! it: batch fetching, alert evaluation, the update pipeline and reports.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
