// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::{auth, desired_projects, projects, teams, users};

pub use state::AppState;

/// Builds the full HTTP router over the given state
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        // Auth routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", put(auth::change_password))
        // User routes
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:id/ban", post(users::ban_user))
        // Team routes
        .route("/api/teams", post(teams::create_team).get(teams::list_teams))
        .route(
            "/api/teams/:id",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route(
            "/api/teams/:id/members",
            post(teams::add_members).delete(teams::remove_members),
        )
        .route(
            "/api/teams/:id/members/:user_id/roles",
            post(teams::assign_role).put(teams::set_member_roles),
        )
        .route(
            "/api/teams/:id/members/:user_id/roles/:role",
            delete(teams::revoke_role),
        )
        // Project routes
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/projects/:id/status", put(projects::change_status))
        .route(
            "/api/projects/:id/technologies",
            post(projects::add_technology).put(projects::set_technologies),
        )
        .route(
            "/api/projects/:id/technologies/:technology",
            delete(projects::remove_technology),
        )
        .route(
            "/api/projects/:id/participants",
            post(projects::add_participants).delete(projects::remove_participants),
        )
        .route(
            "/api/projects/:id/participants/:user_id/roles",
            post(projects::assign_role).put(projects::set_participant_roles),
        )
        .route(
            "/api/projects/:id/participants/:user_id/roles/:role",
            delete(projects::revoke_role),
        )
        // Desired project routes
        .route(
            "/api/desired-projects",
            post(desired_projects::create_desired_project).get(desired_projects::list_own),
        )
        .route(
            "/api/desired-projects/:id",
            get(desired_projects::get_desired_project)
                .patch(desired_projects::update_desired_project)
                .delete(desired_projects::delete_desired_project),
        )
        .route(
            "/api/desired-projects/:id/technologies",
            post(desired_projects::add_technology).put(desired_projects::set_technologies),
        )
        .route(
            "/api/desired-projects/:id/technologies/:technology",
            delete(desired_projects::remove_technology),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
