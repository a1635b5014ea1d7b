//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows including:
//! - User registration and authentication
//! - Team and project management
//! - Bearer authentication on protected endpoints
//! - Error status mapping
//!
//! The router runs over the in-memory store, so no database is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use devcollab_api::api::{self, AppState};
use devcollab_api::config::AppConfig;
use devcollab_api::infrastructure::memory::MemoryStore;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application over a fresh in-memory store
fn setup_app() -> Router {
    let config = AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    };
    api::router(AppState::new(Arc::new(MemoryStore::new()), &config))
}

/// Sends one request and returns the status with the parsed JSON body
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&payload).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Registers a user and returns (access token, user id)
async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@test.com"),
            "password": "testpassword123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let token = json["access_token"].as_str().unwrap().to_string();
    let (status, me) = send(app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    (token, me["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let app = setup_app();
    let (_, user_id) = register(&app, "loginflow").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({
            "email": "loginflow@test.com",
            "password": "testpassword123"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["token_type"], "bearer");
    assert!(!json["refresh_token"].as_str().unwrap().is_empty());

    let access = json["access_token"].as_str().unwrap();
    let (status, me) = send(&app, "GET", "/api/auth/me", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.as_str());
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = setup_app();
    register(&app, "wrongpass").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({
            "email": "wrongpass@test.com",
            "password": "not-the-password"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = setup_app();
    register(&app, "twice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "twice_again",
            "email": "twice@test.com",
            "password": "testpassword123"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = setup_app();

    let (status, json) = send(&app, "GET", "/api/teams", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Missing authorization header");

    let (status, _) = send(&app, "GET", "/api/teams", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let app = setup_app();
    let (_, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "refresher",
            "email": "refresher@test.com",
            "password": "testpassword123"
        })),
    )
    .await;
    let refresh = json["refresh_token"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["refresh_token"], refresh.as_str());

    let access = json["access_token"].as_str().unwrap();
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_team_and_project_lifecycle() {
    let app = setup_app();
    let (owner_token, owner_id) = register(&app, "captain").await;
    let (dev_token, dev_id) = register(&app, "deckhand").await;

    // Create team
    let (status, team) = send(
        &app,
        "POST",
        "/api/teams",
        Some(&owner_token),
        Some(json!({ "name": "Crustaceans", "description": "Rust people" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(team["owner_id"], owner_id.as_str());
    let team_id = team["id"].as_str().unwrap().to_string();

    // Add a member
    let (status, team) = send(
        &app,
        "POST",
        &format!("/api/teams/{team_id}/members"),
        Some(&owner_token),
        Some(json!({
            "members": [{ "user_id": dev_id, "roles": ["backend_developer"] }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team["members"].as_array().unwrap().len(), 2);

    // Members cannot rename the team
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/teams/{team_id}"),
        Some(&dev_token),
        Some(json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Create project
    let (status, project) = send(
        &app,
        "POST",
        "/api/projects",
        Some(&owner_token),
        Some(json!({
            "name": "Shipyard",
            "team_id": team_id,
            "description": "Building boats in the open",
            "technologies": ["rust", "postgresql"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["status"], "active");
    assert_eq!(project["manager_id"], owner_id.as_str());
    let project_id = project["id"].as_str().unwrap().to_string();

    // Add the member as a developer
    let (status, project) = send(
        &app,
        "POST",
        &format!("/api/projects/{project_id}/participants"),
        Some(&owner_token),
        Some(json!({
            "participants": [{ "user_id": dev_id, "roles": ["developer"] }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["participants"].as_array().unwrap().len(), 2);

    // Developers change the stack
    let (status, project) = send(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}/technologies/postgresql"),
        Some(&dev_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["technologies"], json!(["rust"]));

    // The last technology stays
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/projects/{project_id}/technologies/rust"),
        Some(&dev_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Only the manager changes status
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}/status"),
        Some(&dev_token),
        Some(json!({ "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, project) = send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}/status"),
        Some(&owner_token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["status"], "completed");

    // Lookup by name
    let (status, found) = send(
        &app,
        "GET",
        "/api/projects?name=Shipyard",
        Some(&dev_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found[0]["id"], project_id.as_str());

    // Deleting the team takes the project with it
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/teams/{team_id}"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/projects/{project_id}"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_role_cannot_be_revoked_over_http() {
    let app = setup_app();
    let (token, owner_id) = register(&app, "keeper").await;

    let (_, team) = send(
        &app,
        "POST",
        "/api/teams",
        Some(&token),
        Some(json!({ "name": "Keepers" })),
    )
    .await;
    let team_id = team["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/teams/{team_id}/members/{owner_id}/roles/owner"),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("owner"));
}

#[tokio::test]
async fn test_desired_project_endpoints() {
    let app = setup_app();
    let (token, owner_id) = register(&app, "seeker").await;
    let (other_token, _) = register(&app, "lurker").await;

    let (status, desired) = send(
        &app,
        "POST",
        "/api/desired-projects",
        Some(&token),
        Some(json!({
            "description": "Open to frontend work with Vue",
            "technologies": ["vue", "typescript"],
            "amount_of_people": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(desired["owner_id"], owner_id.as_str());
    let desired_id = desired["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/desired-projects/{desired_id}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = send(&app, "GET", "/api/desired-projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/desired-projects/{desired_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_user_can_delete_own_account_only() {
    let app = setup_app();
    let (token, user_id) = register(&app, "leaver").await;
    let (other_token, _) = register(&app, "bystander").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{user_id}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{user_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token now points at a deleted user
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
