//! Location entity - a place the provider reports weather for

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{GeoLocation, LocationKey};

/// A resolved location as returned by the weather provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Normalized identity key derived from `name`
    pub key: LocationKey,
    /// Display name
    pub name: String,
    /// Region or state, if the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Country name
    pub country: String,
    /// Coordinates
    pub coordinates: GeoLocation,
    /// IANA timezone identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Local wall-clock time at the location when the data was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<NaiveDateTime>,
}

impl Location {
    /// Create a location, deriving its identity key from the name
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocation` if the name is blank.
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        coordinates: GeoLocation,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let key = LocationKey::new(&name)?;
        Ok(Self {
            key,
            name,
            region: None,
            country: country.into(),
            coordinates,
            timezone: None,
            local_time: None,
        })
    }

    /// Set the region; blank values are treated as absent
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = non_blank(region.into());
        self
    }

    /// Set the timezone identifier; blank values are treated as absent
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = non_blank(timezone.into());
        self
    }

    /// Set the local time
    #[must_use]
    pub const fn with_local_time(mut self, local_time: NaiveDateTime) -> Self {
        self.local_time = Some(local_time);
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> GeoLocation {
        GeoLocation::new(42.36, -71.06).unwrap()
    }

    #[test]
    fn key_is_derived_from_name() {
        let loc = Location::new(" Boston ", "USA", coords()).unwrap();
        assert_eq!(loc.name, "Boston");
        assert_eq!(loc.key.as_str(), "boston");
    }

    #[test]
    fn blank_name_rejected() {
        assert!(Location::new("  ", "USA", coords()).is_err());
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let loc = Location::new("Boston", "USA", coords())
            .unwrap()
            .with_region("  ")
            .with_timezone("America/New_York");
        assert!(loc.region.is_none());
        assert_eq!(loc.timezone.as_deref(), Some("America/New_York"));
    }
}
