//! Domain entities - Objects with identity and lifecycle

mod alert;
mod forecast;
mod location;
pub(crate) mod reading;
mod threshold;
mod update_result;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use forecast::{Forecast, ForecastDay};
pub use location::Location;
pub use reading::{DEFAULT_SOURCE, WeatherReading};
pub use threshold::{Bound, Metric, ResolvedThresholds, Threshold};
pub use update_result::UpdateResult;
