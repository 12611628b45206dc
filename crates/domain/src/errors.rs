//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Location name is blank or otherwise unusable as an identity key
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Threshold definition is inconsistent
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Unknown alert metric name
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A weather reading failed validation
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Date/time parsing error
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_entity_and_id() {
        let err = DomainError::not_found("Alert", "a1b2c3d4e5f6");
        match err {
            DomainError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Alert");
                assert_eq!(id, "a1b2c3d4e5f6");
            },
            _ => unreachable!("Expected NotFound error"),
        }
    }

    #[test]
    fn not_found_error_message() {
        let err = DomainError::not_found("Alert", "a1b2c3d4e5f6");
        assert_eq!(err.to_string(), "Alert not found: a1b2c3d4e5f6");
    }

    #[test]
    fn invalid_location_message() {
        let err = DomainError::InvalidLocation("blank name".to_string());
        assert_eq!(err.to_string(), "Invalid location: blank name");
    }

    #[test]
    fn unknown_metric_message() {
        let err = DomainError::UnknownMetric("rainfall".to_string());
        assert_eq!(err.to_string(), "Unknown metric: rainfall");
    }

    #[test]
    fn invalid_reading_message() {
        let err = DomainError::InvalidReading("humidity 120".to_string());
        assert_eq!(err.to_string(), "Invalid reading: humidity 120");
    }
}
