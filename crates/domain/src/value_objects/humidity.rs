//! Relative humidity value object

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a humidity percentage is above 100
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid humidity: {0}% is out of range (must be 0-100)")]
pub struct InvalidHumidity(u16);

/// Relative humidity percentage, always within 0-100
///
/// ```
/// use domain::value_objects::Humidity;
///
/// let h = Humidity::new(93).expect("valid humidity");
/// assert!(h.exceeds(90.0));
/// assert_eq!(h.to_string(), "93%");
/// assert!(Humidity::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Humidity(u8);

impl Humidity {
    /// Upper bound of the percentage scale
    pub const MAX: u8 = 100;

    /// Create a validated humidity value
    ///
    /// Takes a `u16` because provider payloads are not trusted to stay
    /// within `u8`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHumidity` if the value is greater than 100.
    pub fn new(value: u16) -> Result<Self, InvalidHumidity> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(InvalidHumidity(value))
    }

    /// Percentage as an integer
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Percentage as a float, for threshold comparisons
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Whether this humidity is strictly above the given percentage
    #[must_use]
    pub fn exceeds(self, threshold: f64) -> bool {
        self.as_f64() > threshold
    }
}

impl fmt::Display for Humidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Humidity {
    type Error = InvalidHumidity;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(u16::from(value))
    }
}

impl From<Humidity> for u8 {
    fn from(h: Humidity) -> Self {
        h.0
    }
}

impl<'de> Deserialize<'de> for Humidity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u16::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        assert_eq!(Humidity::new(0).unwrap().value(), 0);
        assert_eq!(Humidity::new(100).unwrap().value(), 100);
    }

    #[test]
    fn rejects_above_hundred() {
        let err = Humidity::new(120).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid humidity: 120% is out of range (must be 0-100)"
        );
        assert!(Humidity::new(300).is_err());
    }

    #[test]
    fn exceeds_is_strict() {
        let h = Humidity::new(90).unwrap();
        assert!(!h.exceeds(90.0));
        assert!(h.exceeds(89.5));
    }

    #[test]
    fn deserialization_validates() {
        let h: Humidity = serde_json::from_str("65").unwrap();
        assert_eq!(h.value(), 65);
        assert!(serde_json::from_str::<Humidity>("101").is_err());
    }

    #[test]
    fn serializes_as_number() {
        let h = Humidity::new(42).unwrap();
        assert_eq!(serde_json::to_string(&h).unwrap(), "42");
    }
}
