use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value is missing or empty.
    #[error("`{0}` must be set and not empty")]
    MissingField(&'static str),
    /// A value is present but violates a constraint.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue {
        field: &'static str,
        constraint: String,
    },
    /// Maximum bulk workers cannot be zero.
    #[error("`pipeline.max_workers` cannot be zero")]
    MaxWorkersZero,
}

/// Returns [`ValidationError::MissingField`] when `value` is empty or only whitespace.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    Ok(())
}
