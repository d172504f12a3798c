//! Payload parsing errors.

use thiserror::Error;

/// # Errors produced while populating a payload from JSON.
///
/// Recoverable boundary conditions: the caller keeps the payload in its
/// pre-parse state for any field the parser rejected.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The input was not valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A field was present but carried a value the payload cannot accept.
    #[error("invalid value {value:?} for field {field:?}")]
    InvalidField {
        /// JSON field name.
        field: &'static str,
        /// The offending value, rendered for diagnostics.
        value: String,
    },
}

impl PayloadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PayloadError::Malformed(_) => "payload_malformed",
            PayloadError::InvalidField { .. } => "payload_invalid_field",
        }
    }
}
