//! Error types for request validation.

use thiserror::Error;

/// A request that cannot be turned into a pipeline run.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    /// A coordinate was not a finite number.
    #[error("Invalid {field} coordinate: {value}")]
    InvalidCoordinate { field: &'static str, value: String },

    /// The window is empty, inverted or out of range.
    #[error("Invalid bounding window: {reason}")]
    InvalidWindow { reason: String },

    /// A country code cannot be used in the attribute filter.
    #[error("Invalid country code: {code:?}")]
    InvalidCountryCode { code: String },

    /// No country was selected, directly or through a continent.
    #[error("No countries selected")]
    EmptySelection,
}
