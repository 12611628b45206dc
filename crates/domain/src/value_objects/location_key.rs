//! Location identity key
//!
//! Locations are identified by their normalized name: trimmed, inner
//! whitespace collapsed and lower-cased. "  New   York " and "new york"
//! are the same location for lookups, deduplication and thresholds.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::LocationKey;
//!
//! let key = LocationKey::new("  New   York ").expect("valid name");
//! assert_eq!(key.as_str(), "new york");
//!
//! assert!(LocationKey::new("   ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Normalized, case-insensitive location identity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    /// Normalize a location name into its identity key
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocation` if the name is blank.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let normalized = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::InvalidLocation(
                "location name must not be blank".to_string(),
            ));
        }

        Ok(Self(normalized))
    }

    /// Get the normalized key
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for LocationKey {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for LocationKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for LocationKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let key = LocationKey::new("  LONDON  ").unwrap();
        assert_eq!(key.as_str(), "london");

        let key = LocationKey::new("New\tYork").unwrap();
        assert_eq!(key.as_str(), "new york");
    }

    #[test]
    fn equal_names_yield_equal_keys() {
        assert_eq!(
            LocationKey::new("Riverside").unwrap(),
            LocationKey::new(" riverside ").unwrap()
        );
    }

    #[test]
    fn blank_name_rejected() {
        assert!(LocationKey::new("").is_err());
        assert!(LocationKey::new(" \t\n").is_err());
    }

    #[test]
    fn display_shows_normalized_form() {
        let key = LocationKey::new("Tokyo").unwrap();
        assert_eq!(key.to_string(), "tokyo");
    }

    #[test]
    fn deserialization_normalizes() {
        let key: LocationKey = serde_json::from_str("\" Boston \"").unwrap();
        assert_eq!(key.as_str(), "boston");
    }

    #[test]
    fn deserialization_rejects_blank() {
        let result: Result<LocationKey, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = LocationKey::new("Valsad").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"valsad\"");
    }
}
