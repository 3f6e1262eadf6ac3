//! Error types for filter construction and request validation.

use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised by the filter handler and by request validation.
///
/// Host evaluation itself never fails: a filter answers `true` or `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A configured filter name does not resolve to a registered filter.
    #[error("filter '{name}' is not registered in namespace '{namespace}'")]
    UnknownFilter { namespace: String, name: String },

    /// The request carries a malformed field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An extra spec key or value is not acceptable.
    #[error("invalid extra spec {key}: {value}")]
    InvalidExtraSpec { key: String, value: String },

    /// A JSON query hint could not be parsed.
    #[error("invalid query hint: {0}")]
    InvalidQuery(String),
}

impl FilterError {
    /// Returns true if this error is caused by the request rather than configuration.
    pub fn is_invalid_request(&self) -> bool {
        !matches!(self, FilterError::UnknownFilter { .. })
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::InvalidRequest(err.to_string())
    }
}
