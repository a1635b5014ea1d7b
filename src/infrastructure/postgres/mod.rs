// PostgreSQL adapters (sqlx)
// Every repository of a unit of work runs on the scope's single transaction.

mod desired_project_repository;
mod project_repository;
mod team_repository;
mod unit_of_work;
mod user_repository;

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::{PgConnection, Postgres, Transaction};
use tokio::sync::Mutex;

use crate::domain::errors::DomainError;
use crate::domain::repositories::{RepositoryError, RepositoryResult};

pub use desired_project_repository::PostgresDesiredProjectRepository;
pub use project_repository::PostgresProjectRepository;
pub use team_repository::PostgresTeamRepository;
pub use unit_of_work::{PgUnitOfWork, PgUnitOfWorkFactory};
pub use user_repository::PostgresUserRepository;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// The transaction shared by one scope's repositories; `None` once closed
pub(crate) type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

pub(crate) fn connection<'a>(
    slot: &'a mut Option<Transaction<'static, Postgres>>,
) -> RepositoryResult<&'a mut PgConnection> {
    slot.as_deref_mut().ok_or(RepositoryError::ScopeClosed)
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code();
            if matches!(code.as_deref(), Some(UNIQUE_VIOLATION | FOREIGN_KEY_VIOLATION)) {
                return RepositoryError::Conflict(db_err.message().to_string());
            }
        }
        RepositoryError::Database(err.to_string())
    }
}

/// Parses a stored text array into a role or technology set
pub(crate) fn parse_set<T>(values: Vec<String>) -> RepositoryResult<BTreeSet<T>>
where
    T: FromStr<Err = DomainError> + Ord,
{
    values
        .iter()
        .map(|value| parse_text(value))
        .collect()
}

pub(crate) fn parse_text<T>(value: &str) -> RepositoryResult<T>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|e: DomainError| RepositoryError::Corrupt(e.to_string()))
}

pub(crate) fn to_texts<T: Display>(values: &BTreeSet<T>) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

pub(crate) fn to_count(value: i64) -> RepositoryResult<usize> {
    usize::try_from(value).map_err(|_| RepositoryError::Corrupt(format!("negative count {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::TeamRole;

    #[test]
    fn role_arrays_parse_into_sets() {
        let roles: BTreeSet<TeamRole> =
            parse_set(vec!["owner".to_string(), "designer".to_string()]).unwrap();
        assert_eq!(roles, BTreeSet::from([TeamRole::Owner, TeamRole::Designer]));
        assert_eq!(to_texts(&roles), vec!["owner", "designer"]);
    }

    #[test]
    fn unknown_stored_value_is_corrupt() {
        let result: RepositoryResult<BTreeSet<TeamRole>> = parse_set(vec!["pirate".to_string()]);
        assert!(matches!(result, Err(RepositoryError::Corrupt(_))));
    }

    #[test]
    fn non_database_errors_map_to_database_variant() {
        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
