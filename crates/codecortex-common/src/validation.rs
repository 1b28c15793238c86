//! Validation traits and common validators
//!
//! Shared by the configuration types so range checks read the same way in
//! every crate.

use std::ops::RangeInclusive;
use thiserror::Error;

/// Validation error with context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Value out of range for {field}: expected {expected}, got {actual}")]
    OutOfRange {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Trait for types that can be validated
pub trait Validatable {
    /// Validate the instance, returning Ok(()) if valid or a ValidationError if invalid
    fn validate(&self) -> Result<(), ValidationError>;

    /// Check if the instance is valid without returning the error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Trait for validators that can check values
pub trait Validator<T: ?Sized> {
    fn validate(&self, value: &T) -> Result<(), ValidationError>;
}

/// Accepts finite floats in `[0.0, 1.0]` (thresholds, fractions, probabilities)
pub struct UnitIntervalValidator {
    field_name: String,
}

impl UnitIntervalValidator {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

impl Validator<f64> for UnitIntervalValidator {
    fn validate(&self, value: &f64) -> Result<(), ValidationError> {
        if !value.is_finite() || !(0.0..=1.0).contains(value) {
            return Err(ValidationError::OutOfRange {
                field: self.field_name.clone(),
                expected: "0.0..=1.0".to_string(),
                actual: value.to_string(),
            });
        }
        Ok(())
    }
}

/// Integer range validator
pub struct RangeValidator {
    field_name: String,
    range: RangeInclusive<u64>,
}

impl RangeValidator {
    pub fn new(field_name: impl Into<String>, min: u64, max: u64) -> Self {
        Self {
            field_name: field_name.into(),
            range: min..=max,
        }
    }

    /// At least one, no upper bound
    pub fn positive(field_name: impl Into<String>) -> Self {
        Self::new(field_name, 1, u64::MAX)
    }
}

impl Validator<u64> for RangeValidator {
    fn validate(&self, value: &u64) -> Result<(), ValidationError> {
        if !self.range.contains(value) {
            return Err(ValidationError::OutOfRange {
                field: self.field_name.clone(),
                expected: format!("{:?}", self.range),
                actual: value.to_string(),
            });
        }
        Ok(())
    }
}

/// Non-empty string validator
pub struct NonEmptyStringValidator {
    field_name: String,
}

impl NonEmptyStringValidator {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

impl Validator<str> for NonEmptyStringValidator {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: self.field_name.clone(),
            });
        }
        Ok(())
    }
}

/// Collect the failures of several checks into one error
pub fn collect_errors(results: Vec<Result<(), ValidationError>>) -> Result<(), ValidationError> {
    let mut errors: Vec<ValidationError> = results.into_iter().filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
