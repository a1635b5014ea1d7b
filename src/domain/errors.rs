use thiserror::Error;
use uuid::Uuid;

/// Errors raised by aggregates and value objects when a mutation would
/// violate an invariant.
///
/// Every aggregate method that returns one of these leaves the aggregate
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User {0} is already present")]
    DuplicateMember(Uuid),

    #[error("Invalid role set: {0}")]
    InvalidRoleSet(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Forbidden operation: {0}")]
    ForbiddenOperation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
