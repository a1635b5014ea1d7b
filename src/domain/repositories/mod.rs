// Repository contracts
// Adapters live in infrastructure; services only see these traits.

pub mod desired_project_repository;
pub mod errors;
pub mod project_repository;
pub mod team_repository;
pub mod unit_of_work;
pub mod user_repository;

pub use desired_project_repository::DesiredProjectRepository;
pub use errors::{RepositoryError, RepositoryResult};
pub use project_repository::ProjectRepository;
pub use team_repository::TeamRepository;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
pub use user_repository::UserRepository;
