//! Error types for qtl2rest.
//!
//! [`ApiError`] is the single error type handlers return. The taxonomy is
//! deliberately flat: every kind is reported to clients as HTTP 400 with an
//! error envelope, and not-found is not distinguished from bad-request at the
//! transport level.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required query parameter was absent.
    MissingParameter,
    /// A query parameter was present but malformed.
    Validation,
    /// A dataset identifier did not resolve.
    DatasetNotFound,
    /// The computation collaborator reported a failure.
    Domain,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    ///
    /// Always `400 Bad Request`.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Errors surfaced by endpoint handlers and their collaborators.
///
/// # Example
///
/// ```
/// use qtl2rest_core::{ApiError, ErrorKind};
///
/// let err = ApiError::missing("id");
/// assert_eq!(err.to_string(), "id is required");
/// assert_eq!(err.kind(), ErrorKind::MissingParameter);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Required query parameter absent.
    #[error("{name} is required")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },

    /// Query parameter present but unusable.
    #[error("{name} {reason}")]
    Validation {
        /// Parameter name.
        name: String,
        /// What is wrong with the value, e.g. "must be an integer".
        reason: String,
    },

    /// Unknown dataset identifier.
    #[error("dataset '{id}' not found")]
    DatasetNotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// Failure reported by a computation collaborator.
    #[error("{message}")]
    Domain {
        /// Collaborator message, passed through verbatim.
        message: String,
    },
}

impl ApiError {
    /// Creates a missing-parameter error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Creates a validation error for a named parameter.
    #[must_use]
    pub fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a dataset-not-found error.
    #[must_use]
    pub fn dataset_not_found(id: impl Into<String>) -> Self {
        Self::DatasetNotFound { id: id.into() }
    }

    /// Creates a domain computation error.
    #[must_use]
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::DatasetNotFound { .. } => ErrorKind::DatasetNotFound,
            Self::Domain { .. } => ErrorKind::Domain,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns `true` for errors caused by the request's own parameters.
    ///
    /// Parameter errors are reported with their own message as the envelope
    /// `error`; every other kind uses the endpoint's failure message.
    #[must_use]
    pub const fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::Validation { .. }
        )
    }
}

impl From<crate::TableError> for ApiError {
    fn from(err: crate::TableError) -> Self {
        Self::domain(err.to_string())
    }
}

/// Errors raised while writing a [`Response`](crate::Response) body.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// The body has already been content-encoded and must not be replaced.
    #[error("response body is already encoded")]
    AlreadyEncoded,

    /// JSON serialization failed.
    #[error("failed to serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        assert_eq!(ApiError::missing("dataset").to_string(), "dataset is required");
    }

    #[test]
    fn test_validation_message() {
        let err = ApiError::validation("cores", "must be an integer");
        assert_eq!(err.to_string(), "cores must be an integer");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_dataset_not_found_message() {
        let err = ApiError::dataset_not_found("bad_id");
        assert_eq!(err.to_string(), "dataset 'bad_id' not found");
    }

    #[test]
    fn test_every_kind_is_bad_request() {
        let errors = [
            ApiError::missing("id"),
            ApiError::validation("location", "must be an integer"),
            ApiError::dataset_not_found("x"),
            ApiError::domain("singular matrix"),
        ];

        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_parameter_error_classification() {
        assert!(ApiError::missing("id").is_parameter_error());
        assert!(ApiError::validation("id", "bad").is_parameter_error());
        assert!(!ApiError::dataset_not_found("x").is_parameter_error());
        assert!(!ApiError::domain("boom").is_parameter_error());
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::DatasetNotFound).unwrap();
        assert_eq!(json, "\"dataset_not_found\"");
    }
}
