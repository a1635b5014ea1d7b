use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::ServiceError;
use crate::domain::errors::DomainError;
use crate::domain::repositories::RepositoryError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::NotFound(_) => Self::not_found(message),
            ServiceError::AlreadyExists(_) => Self::conflict(message),
            ServiceError::AccessDenied(_) => Self::forbidden(message),
            ServiceError::Validation(_) => Self::bad_request(message),
            ServiceError::InvalidCredentials | ServiceError::InvalidToken => {
                Self::unauthorized(message)
            }
            ServiceError::Domain(DomainError::NotFound(_)) => Self::not_found(message),
            ServiceError::Domain(DomainError::DuplicateMember(_)) => Self::conflict(message),
            ServiceError::Domain(_) => Self::bad_request(message),
            ServiceError::Repository(RepositoryError::NotFound { .. }) => Self::not_found(message),
            ServiceError::Repository(RepositoryError::Conflict(_)) => Self::conflict(message),
            ServiceError::Repository(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %message, "Request failed");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(status_of(ServiceError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ServiceError::AlreadyExists("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(ServiceError::AccessDenied("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ServiceError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn domain_errors_are_client_errors() {
        assert_eq!(
            status_of(DomainError::DuplicateMember(Uuid::new_v4()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::ForbiddenOperation("owner".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::CapacityExceeded("full".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_failures_hide_details() {
        let err = ApiError::from(ServiceError::Repository(RepositoryError::Database(
            "connection reset".into(),
        )));

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }
}
