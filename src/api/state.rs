use std::sync::Arc;

use chrono::Duration;

use crate::application::{AuthService, DesiredProjectService, ProjectService, TeamService, UserService};
use crate::auth::{BcryptPasswordHasher, JwtService, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::domain::repositories::UnitOfWorkFactory;

/// Shared handler state: one instance of every service
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub teams: Arc<TeamService>,
    pub projects: Arc<ProjectService>,
    pub desired_projects: Arc<DesiredProjectService>,
}

impl AppState {
    /// Wires the services over any unit-of-work factory
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>, config: &AppConfig) -> Self {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));
        let tokens: Arc<dyn TokenService> = Arc::new(JwtService::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_expire_minutes),
            Duration::days(config.refresh_token_expire_days),
        ));

        Self {
            auth: Arc::new(AuthService::new(
                Arc::clone(&uow),
                Arc::clone(&hasher),
                tokens,
            )),
            users: Arc::new(UserService::new(Arc::clone(&uow), hasher)),
            teams: Arc::new(TeamService::new(Arc::clone(&uow), config.membership)),
            projects: Arc::new(ProjectService::new(Arc::clone(&uow), config.membership)),
            desired_projects: Arc::new(DesiredProjectService::new(uow, config.membership)),
        }
    }
}
