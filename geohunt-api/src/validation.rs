//! Validation Traits
//!
//! Request bodies are checked here before anything reaches the engine.

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use geohunt_api::validation::ValidateNonEmpty;
///
/// fn unlock(treasure_id: &str) -> ApiResult<()> {
///     treasure_id.validate_non_empty("treasure_id")?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Upper bound on string length, counted in bytes.
pub trait ValidateMaxLength {
    fn validate_max_length(&self, field_name: &str, max: usize) -> ApiResult<()>;
}

impl ValidateMaxLength for str {
    fn validate_max_length(&self, field_name: &str, max: usize) -> ApiResult<()> {
        if self.len() > max {
            return Err(ApiError::invalid_input(format!(
                "Field '{}' must be at most {} bytes",
                field_name, max
            )));
        }
        Ok(())
    }
}

impl ValidateMaxLength for String {
    fn validate_max_length(&self, field_name: &str, max: usize) -> ApiResult<()> {
        self.as_str().validate_max_length(field_name, max)
    }
}

/// Inclusive bounds for coordinates. NaN and infinities never pass.
///
/// # Example
/// ```ignore
/// use geohunt_api::validation::ValidateRange;
///
/// fn locate(latitude: f64) -> ApiResult<()> {
///     latitude.validate_range("latitude", -90.0, 90.0)?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateRange {
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

impl ValidateRange for f64 {
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
        if !self.is_finite() || !(min..=max).contains(self) {
            return Err(ApiError::invalid_range(field_name, min, max));
        }
        Ok(())
    }
}

/// Implemented by request bodies; handlers call it before touching state.
pub trait ValidateRequest {
    fn validate(&self) -> ApiResult<()>;
}
