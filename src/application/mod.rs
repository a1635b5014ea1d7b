// Application layer
// Use cases orchestrated over a unit of work

pub mod auth_service;
pub mod desired_project_service;
pub mod errors;
pub mod project_service;
mod scope;
pub mod team_service;
pub mod user_service;

pub use auth_service::{AuthService, TokenPair};
pub use desired_project_service::{DesiredProjectService, NewDesiredProject};
pub use errors::{ServiceError, ServiceResult};
pub use project_service::{NewProject, ParticipantRoles, ProjectService};
pub use team_service::{MemberRoles, NewTeam, TeamChanges, TeamService};
pub use user_service::{UserChanges, UserService};
