//! Transport-facing error taxonomy.

use log::error;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use zettel_core::NoteServiceError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to callers of the use-case API.
///
/// Storage details are logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound,
    ValidationFailure(String),
    Unauthorized,
    StorageFailure,
}

impl ApiError {
    /// HTTP status equivalent for web front ends.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::ValidationFailure(_) => 400,
            Self::Unauthorized => 422,
            Self::StorageFailure => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ValidationFailure(_) => "validation_failure",
            Self::Unauthorized => "unauthorized",
            Self::StorageFailure => "storage_failure",
        }
    }

    /// JSON error payload.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code(),
            message: self.to_string(),
        }
    }

    /// Maps a service error, logging storage failures under `operation`.
    pub(crate) fn from_service(operation: &'static str, err: NoteServiceError) -> Self {
        match err {
            NoteServiceError::NoteNotFound(_) => Self::NotFound,
            NoteServiceError::InvalidQuery(parse_err) => {
                Self::ValidationFailure(parse_err.to_string())
            }
            NoteServiceError::Unauthorized => Self::Unauthorized,
            NoteServiceError::Repo(repo_err) => {
                error!(
                    "event={operation} module=api status=error error_code=storage_failure error={repo_err}"
                );
                Self::StorageFailure
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "note not found"),
            Self::ValidationFailure(message) => write!(f, "invalid request: {message}"),
            Self::Unauthorized => write!(f, "request could not be processed"),
            Self::StorageFailure => write!(f, "internal storage error"),
        }
    }
}

impl Error for ApiError {}

/// Serialized form of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use zettel_core::{NoteServiceError, QueryParseError, RepoError};

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::NotFound.status_code(), 404);
        assert_eq!(ApiError::ValidationFailure("x".into()).status_code(), 400);
        assert_eq!(ApiError::Unauthorized.status_code(), 422);
        assert_eq!(ApiError::StorageFailure.status_code(), 500);
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = ApiError::from_service(
            "note_save",
            NoteServiceError::Repo(RepoError::InvalidData("secret table name".into())),
        );
        assert_eq!(err, ApiError::StorageFailure);
        assert!(!err.body().message.contains("secret"));
    }

    #[test]
    fn query_errors_become_validation_failures() {
        let err = ApiError::from_service(
            "note_list",
            NoteServiceError::InvalidQuery(QueryParseError::EmptyRequiredTag),
        );
        assert!(matches!(err, ApiError::ValidationFailure(_)));
        assert_eq!(err.body().error, "validation_failure");
    }
}
