use thiserror::Error;

use crate::auth::AuthError;
use crate::domain::errors::DomainError;
use crate::domain::repositories::RepositoryError;

/// Failures surfaced by application services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ServiceError::InvalidToken,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_split_between_token_and_internal() {
        assert!(matches!(
            ServiceError::from(AuthError::InvalidToken),
            ServiceError::InvalidToken
        ));
        assert!(matches!(
            ServiceError::from(AuthError::Hashing("boom".into())),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn domain_error_message_is_kept() {
        let err: ServiceError = DomainError::Validation("bad name".into()).into();
        assert_eq!(err.to_string(), "Validation failed: bad name");
    }
}
