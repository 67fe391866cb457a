//! Error types for mapper operations.
//!
//! Every failure a mapper can raise is a `MapperError`. Driver failures keep
//! the original `DriverError` (and with it the SQLSTATE or driver code) so
//! callers can log the full diagnostic while deciding what to expose.

use crate::executor::DriverError;
use crate::model::ValidationErrors;

/// Error type for mapper operations
#[derive(Debug)]
pub enum MapperError {
    /// A Filter, Sort, Join or Property was built with an invalid shape
    Construction(String),
    /// The mapper definition itself is unusable (missing id property, bad shorthand)
    Configuration(String),
    /// A filter or sort references a property neither mapped nor declared by the entity
    Query(String),
    /// The entity failed validation before `save`
    Validation(ValidationErrors),
    /// Invalid call arguments (pagination bounds, nothing to write, unparseable temporal value)
    InvalidArgument(String),
    /// The connection failed while running `statement`
    Driver {
        statement: String,
        source: DriverError,
    },
}

impl MapperError {
    /// Driver-level error code (SQLSTATE for Postgres), if the failure came from the connection
    pub fn driver_code(&self) -> Option<String> {
        match self {
            MapperError::Driver { source, .. } => source.code(),
            _ => None,
        }
    }

    /// `true` for errors raised before any SQL reached the connection
    pub fn is_pre_execution(&self) -> bool {
        !matches!(self, MapperError::Driver { .. })
    }
}

impl std::fmt::Display for MapperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapperError::Construction(msg) => write!(f, "Construction error: {}", msg),
            MapperError::Configuration(msg) => {
                write!(f, "Mapper configuration error: {}", msg)
            }
            MapperError::Query(msg) => write!(f, "Query error: {}", msg),
            MapperError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            MapperError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            MapperError::Driver { statement, source } => {
                write!(f, "Driver error: {}\nStatement: {}", source, statement)
            }
        }
    }
}

impl std::error::Error for MapperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapperError::Driver { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for MapperError {
    fn from(errors: ValidationErrors) -> Self {
        MapperError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_prefixes() {
        assert!(MapperError::Construction("x".into()).to_string().starts_with("Construction error"));
        assert!(MapperError::Configuration("x".into()).to_string().contains("configuration"));
        assert!(MapperError::Query("x".into()).to_string().starts_with("Query error"));
        assert!(MapperError::InvalidArgument("x".into()).to_string().starts_with("Invalid argument"));
    }

    #[test]
    fn test_driver_error_keeps_code_and_source() {
        let err = MapperError::Driver {
            statement: "SELECT 1".to_string(),
            source: DriverError::StatementError {
                code: Some("23505".to_string()),
                message: "duplicate key".to_string(),
            },
        };
        assert_eq!(err.driver_code().as_deref(), Some("23505"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("SELECT 1"));
        assert!(!err.is_pre_execution());
    }

    #[test]
    fn test_non_driver_errors_have_no_code() {
        let err = MapperError::Query("unknown property".into());
        assert_eq!(err.driver_code(), None);
        assert!(err.is_pre_execution());
    }
}
