//! Error types for form operations.
//!
//! Field-local problems (validation messages, coercion failures) never
//! surface here; they attach to the offending cell as severity-carrying
//! [`ValidationResult`](crate::validation::ValidationResult)s. Only
//! whole-form operations return [`FormError`]: a malformed root schema at
//! bind time, a commit against an unknown path, a host-requested abort, or
//! `validate()` finding error-severity fields. Authoring mistakes inside
//! individual schema nodes degrade to collected warnings instead.

use thiserror::Error;

/// Result type for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors that can occur in whole-form operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// The root schema is not an object and cannot be bound.
    #[error("Malformed schema: {0}")]
    Schema(String),

    /// An operation referenced a path with no bound field.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The host validator requested an abort of the surrounding workflow.
    #[error("Host abort: {0}")]
    HostThrow(String),

    /// `validate()` found at least one field with error severity.
    #[error("{failed} required inputs are not specified properly")]
    ValidationFailed {
        /// Number of fields holding error severity.
        failed: usize,
    },
}
