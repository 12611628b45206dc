//! Weathervane command-line front end
//!
//! Argument definitions, service wiring and the scheduler lifecycle, shared
//! by the binary and its tests.

pub mod cli;
pub mod lifecycle;
pub mod output;
pub mod wiring;

pub use cli::{Cli, Commands, log_filter_from_verbosity};
pub use lifecycle::start_or_shutdown;
pub use output::save_forecast;
pub use wiring::Pipeline;
