//! Value Objects - Immutable, identity-less domain primitives

mod alert_id;
mod geo_location;
mod humidity;
mod location_key;

pub use alert_id::AlertId;
pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use humidity::{Humidity, InvalidHumidity};
pub use location_key::LocationKey;
