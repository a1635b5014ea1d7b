use thiserror::Error;
use uuid::Uuid;

/// Failures reported by repository and unit-of-work implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Unit of work is already closed")]
    ScopeClosed,

    #[error("Database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
