// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod desired_project;
pub mod errors;
pub mod project;
pub mod repositories;
pub mod roster;
pub mod team;
pub mod tech_profile;
pub mod user;

pub use errors::{DomainError, DomainResult};
