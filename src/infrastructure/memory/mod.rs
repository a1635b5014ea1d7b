//! In-memory unit of work
//!
//! Thread-safe store with the same transactional contract as the PostgreSQL
//! adapter. Suitable for tests and local development.
//!
//! A scope works on a private copy of the committed tables. `commit` replays
//! the rows the scope changed onto the current committed state, so scopes
//! touching different rows both persist and the same row resolves
//! last-commit-wins. A replay that breaks a unique or foreign-key constraint
//! fails with `Conflict` and leaves the store untouched. `rollback` or
//! dropping the scope discards the copy.

mod repositories;
mod tables;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use self::repositories::{
    MemoryDesiredProjectRepository, MemoryProjectRepository, MemoryTeamRepository,
    MemoryUserRepository, WorkingCopy,
};
use self::tables::Tables;
use crate::domain::repositories::{
    DesiredProjectRepository, ProjectRepository, RepositoryResult, TeamRepository, UnitOfWork,
    UnitOfWorkFactory, UserRepository,
};

/// Shared committed state; cloning shares the same store
///
/// # Example
///
/// ```
/// use devcollab_api::domain::repositories::UnitOfWorkFactory;
/// use devcollab_api::infrastructure::memory::MemoryStore;
///
/// let store = MemoryStore::new();
/// let _factory: &dyn UnitOfWorkFactory = &store;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    async fn begin(&self) -> RepositoryResult<Box<dyn UnitOfWork>> {
        let base = self.committed.read().clone();
        let work: WorkingCopy = Arc::new(Mutex::new(base.clone()));
        Ok(Box::new(MemoryUnitOfWork {
            committed: Arc::clone(&self.committed),
            base,
            users: MemoryUserRepository {
                work: Arc::clone(&work),
            },
            teams: MemoryTeamRepository {
                work: Arc::clone(&work),
            },
            projects: MemoryProjectRepository {
                work: Arc::clone(&work),
            },
            desired_projects: MemoryDesiredProjectRepository {
                work: Arc::clone(&work),
            },
            work,
        }))
    }
}

struct MemoryUnitOfWork {
    committed: Arc<RwLock<Tables>>,
    /// Committed state when the scope began
    base: Tables,
    work: WorkingCopy,
    users: MemoryUserRepository,
    teams: MemoryTeamRepository,
    projects: MemoryProjectRepository,
    desired_projects: MemoryDesiredProjectRepository,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn teams(&self) -> &dyn TeamRepository {
        &self.teams
    }

    fn projects(&self) -> &dyn ProjectRepository {
        &self.projects
    }

    fn desired_projects(&self) -> &dyn DesiredProjectRepository {
        &self.desired_projects
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        let work = self.work.lock();
        let mut committed = self.committed.write();
        let mut merged = committed.clone();
        merged.replay(&self.base, &work);
        merged.check_constraints()?;
        *committed = merged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepositoryResult<()> {
        Ok(())
    }
}
