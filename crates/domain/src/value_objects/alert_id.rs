//! Alert fingerprint identifier
//!
//! Alerts are identified by a deterministic fingerprint of
//! (location key, alert type, calendar day) so the same condition on the
//! same day always maps to the same id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::AlertType;
use crate::errors::DomainError;
use crate::value_objects::LocationKey;

/// Number of hex characters kept from the digest
const FINGERPRINT_LEN: usize = 12;

/// Deterministic alert identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    /// Compute the fingerprint for a condition on a given day
    #[must_use]
    pub fn fingerprint(location: &LocationKey, alert_type: AlertType, day: NaiveDate) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(location.as_str().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(alert_type.as_str().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());

        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..FINGERPRINT_LEN].to_string())
    }

    /// Parse a previously stored identifier
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` if the value is not a
    /// lower-case hex fingerprint of the expected length.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let valid = value.len() == FINGERPRINT_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(DomainError::ValidationError(format!(
                "malformed alert id: {value}"
            )))
        }
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AlertId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for AlertId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
