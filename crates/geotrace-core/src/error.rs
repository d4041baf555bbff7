//! Error types for record parsing.

use thiserror::Error;

/// Result type alias for record parsing.
pub type RecordResult<T> = Result<T, RecordError>;

/// Reasons an event record cannot be projected into typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not numeric: {value}")]
    InvalidNumber { field: &'static str, value: String },
}
