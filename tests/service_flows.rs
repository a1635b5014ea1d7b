//! Service flows over the in-memory unit of work
//!
//! These tests drive the application services end to end:
//! - Team and project membership rules
//! - Rollback of failed batches
//! - Per-user ceilings
//! - Authentication and account lifecycle

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Duration;
use devcollab_api::application::{
    AuthService, DesiredProjectService, MemberRoles, NewDesiredProject, NewProject, NewTeam,
    ParticipantRoles, ProjectService, ServiceError, TeamService, UserChanges, UserService,
};
use devcollab_api::auth::{BcryptPasswordHasher, JwtService, PasswordHasher, TokenService};
use devcollab_api::config::MembershipPolicy;
use devcollab_api::domain::errors::DomainError;
use devcollab_api::domain::project::{ProjectRole, ProjectStatus};
use devcollab_api::domain::repositories::{RepositoryError, UnitOfWorkFactory};
use devcollab_api::domain::tech_profile::Technology;
use devcollab_api::domain::team::TeamRole;
use devcollab_api::domain::user::{Email, PlatformRole, User, UserStatus};
use devcollab_api::infrastructure::memory::MemoryStore;
use uuid::Uuid;

struct Services {
    store: MemoryStore,
    teams: TeamService,
    projects: ProjectService,
    users: UserService,
    desired: DesiredProjectService,
}

fn services_with(policy: MembershipPolicy) -> Services {
    let store = MemoryStore::new();
    let uow: Arc<dyn UnitOfWorkFactory> = Arc::new(store.clone());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptPasswordHasher::new(4));

    Services {
        teams: TeamService::new(Arc::clone(&uow), policy),
        projects: ProjectService::new(Arc::clone(&uow), policy),
        users: UserService::new(Arc::clone(&uow), hasher),
        desired: DesiredProjectService::new(uow, policy),
        store,
    }
}

fn services() -> Services {
    services_with(MembershipPolicy::default())
}

/// Stores a user directly and returns its id
async fn seed_user(store: &MemoryStore, username: &str) -> Uuid {
    let email = Email::new(format!("{username}@example.com")).expect("valid email");
    let user = User::new(username.to_string(), email, "not-a-real-hash".to_string())
        .expect("valid user");

    let uow = store.begin().await.expect("begin");
    uow.users().add(&user).await.expect("add user");
    uow.commit().await.expect("commit");
    user.id()
}

async fn seed_admin(store: &MemoryStore, username: &str) -> Uuid {
    let id = seed_user(store, username).await;

    let uow = store.begin().await.expect("begin");
    let mut user = uow.users().get_by_id(id).await.unwrap().unwrap();
    user.set_platform_roles(BTreeSet::from([PlatformRole::Admin]))
        .unwrap();
    uow.users().update(&user).await.unwrap();
    uow.commit().await.unwrap();
    id
}

fn new_team(name: &str) -> NewTeam {
    NewTeam {
        name: name.to_string(),
        description: None,
        logo: None,
    }
}

fn new_project(name: &str, team_id: Uuid) -> NewProject {
    NewProject {
        name: name.to_string(),
        team_id,
        description: "A project for collaborating developers".to_string(),
        technologies: BTreeSet::from([Technology::Python]),
        logo: None,
        url: None,
    }
}

fn roles<R: Ord>(roles: impl IntoIterator<Item = R>) -> BTreeSet<R> {
    roles.into_iter().collect()
}

#[tokio::test]
async fn test_team_owner_cannot_be_removed_or_stripped() {
    let svc = services();
    let u1 = seed_user(&svc.store, "owner").await;
    let u2 = seed_user(&svc.store, "maintainer").await;

    let team = svc.teams.create_team(u1, new_team("rustaceans")).await.unwrap();
    svc.teams
        .add_members_batch(
            u1,
            team.id(),
            vec![MemberRoles {
                user_id: u2,
                roles: roles([TeamRole::Maintainer]),
            }],
        )
        .await
        .unwrap();

    let removed = svc.teams.remove_members_batch(u1, team.id(), vec![u1]).await;
    assert!(matches!(
        removed,
        Err(ServiceError::Domain(DomainError::ForbiddenOperation(_)))
    ));

    let emptied = svc
        .teams
        .set_member_roles(u1, team.id(), u2, BTreeSet::new())
        .await;
    assert!(matches!(
        emptied,
        Err(ServiceError::Domain(DomainError::InvalidRoleSet(_)))
    ));

    let revoked = svc
        .teams
        .revoke_role(u1, team.id(), u2, TeamRole::Maintainer)
        .await;
    assert!(matches!(
        revoked,
        Err(ServiceError::Domain(DomainError::ForbiddenOperation(_)))
    ));

    let stored = svc.teams.get_team(team.id()).await.unwrap();
    assert_eq!(
        stored.roster().role_map(),
        BTreeMap::from([
            (u1, roles([TeamRole::Owner])),
            (u2, roles([TeamRole::Maintainer])),
        ])
    );
}

#[tokio::test]
async fn test_participant_batch_with_outsider_is_rejected_whole() {
    let svc = services();
    let manager = seed_user(&svc.store, "manager").await;
    let member = seed_user(&svc.store, "member").await;
    let outsider = seed_user(&svc.store, "outsider").await;

    let team = svc.teams.create_team(manager, new_team("core")).await.unwrap();
    svc.teams
        .add_members_batch(
            manager,
            team.id(),
            vec![MemberRoles {
                user_id: member,
                roles: roles([TeamRole::BackendDeveloper]),
            }],
        )
        .await
        .unwrap();
    let project = svc
        .projects
        .create_project(manager, new_project("platform", team.id()))
        .await
        .unwrap();

    // The member is valid, the outsider is not on the team
    let result = svc
        .projects
        .add_participants_batch(
            manager,
            project.id(),
            vec![
                ParticipantRoles {
                    user_id: member,
                    roles: roles([ProjectRole::Developer]),
                },
                ParticipantRoles {
                    user_id: outsider,
                    roles: roles([ProjectRole::Qa]),
                },
            ],
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let stored = svc.projects.get_project(project.id()).await.unwrap();
    assert_eq!(stored.participant_count(), 1);
    assert!(stored.is_manager(manager));
    assert!(!stored.is_participant(member));
}

#[tokio::test]
async fn test_failed_scope_discards_written_participants() {
    let svc = services();
    let manager = seed_user(&svc.store, "manager").await;
    let developer = seed_user(&svc.store, "developer").await;
    let team = svc.teams.create_team(manager, new_team("rollback")).await.unwrap();
    let project = svc
        .projects
        .create_project(manager, new_project("ledger", team.id()))
        .await
        .unwrap();

    // The participant row is written, then a later write in the scope fails
    let uow = svc.store.begin().await.unwrap();
    let mut working = uow.projects().get_by_id(project.id()).await.unwrap().unwrap();
    working
        .add_participant(developer, roles([ProjectRole::Developer]))
        .unwrap();
    uow.projects().update(&working).await.unwrap();
    assert!(uow
        .projects()
        .get_by_id(project.id())
        .await
        .unwrap()
        .unwrap()
        .is_participant(developer));

    let manager_user = uow.users().get_by_id(manager).await.unwrap().unwrap();
    let clash = uow.users().add(&manager_user).await;
    assert!(matches!(clash, Err(RepositoryError::Conflict(_))));
    uow.rollback().await.unwrap();

    let stored = svc.projects.get_project(project.id()).await.unwrap();
    assert_eq!(
        stored.roster().role_map(),
        BTreeMap::from([(manager, roles([ProjectRole::Manager]))])
    );

    // Same for a scope that is dropped without commit
    {
        let uow = svc.store.begin().await.unwrap();
        uow.projects().update(&working).await.unwrap();
    }
    let stored = svc.projects.get_project(project.id()).await.unwrap();
    assert!(!stored.is_participant(developer));
    assert_eq!(stored.participant_count(), 1);
}

#[tokio::test]
async fn test_project_stack_keeps_at_least_one_technology() {
    let svc = services();
    let manager = seed_user(&svc.store, "manager").await;
    let team = svc.teams.create_team(manager, new_team("stack")).await.unwrap();
    let project = svc
        .projects
        .create_project(manager, new_project("stacked", team.id()))
        .await
        .unwrap();

    let result = svc
        .projects
        .remove_technology(manager, project.id(), Technology::Python)
        .await;
    assert!(result.is_err());

    svc.projects
        .add_technology(manager, project.id(), Technology::React)
        .await
        .unwrap();
    let project = svc
        .projects
        .remove_technology(manager, project.id(), Technology::Python)
        .await
        .unwrap();

    assert_eq!(project.technologies(), &BTreeSet::from([Technology::React]));
}

#[tokio::test]
async fn test_only_manager_changes_status_and_completed_is_final() {
    let svc = services();
    let manager = seed_user(&svc.store, "manager").await;
    let developer = seed_user(&svc.store, "developer").await;

    let team = svc.teams.create_team(manager, new_team("status")).await.unwrap();
    svc.teams
        .add_members_batch(
            manager,
            team.id(),
            vec![MemberRoles {
                user_id: developer,
                roles: roles([TeamRole::BackendDeveloper]),
            }],
        )
        .await
        .unwrap();
    let project = svc
        .projects
        .create_project(manager, new_project("lifecycle", team.id()))
        .await
        .unwrap();
    svc.projects
        .add_participants_batch(
            manager,
            project.id(),
            vec![ParticipantRoles {
                user_id: developer,
                roles: roles([ProjectRole::Developer]),
            }],
        )
        .await
        .unwrap();

    let denied = svc
        .projects
        .change_status(developer, project.id(), ProjectStatus::Paused)
        .await;
    assert!(matches!(denied, Err(ServiceError::AccessDenied(_))));

    // Developers may still change the stack
    svc.projects
        .add_technology(developer, project.id(), Technology::Docker)
        .await
        .unwrap();

    svc.projects
        .change_status(manager, project.id(), ProjectStatus::Completed)
        .await
        .unwrap();
    let again = svc
        .projects
        .change_status(manager, project.id(), ProjectStatus::Completed)
        .await;
    assert!(matches!(
        again,
        Err(ServiceError::Domain(DomainError::InvalidTransition(_)))
    ));
}

#[tokio::test]
async fn test_team_ceiling_per_user() {
    let svc = services_with(MembershipPolicy {
        max_teams_per_user: 1,
        ..MembershipPolicy::default()
    });
    let owner = seed_user(&svc.store, "busy").await;
    let other = seed_user(&svc.store, "other").await;

    svc.teams.create_team(owner, new_team("first")).await.unwrap();
    let second = svc.teams.create_team(owner, new_team("second")).await;
    assert!(matches!(
        second,
        Err(ServiceError::Domain(DomainError::CapacityExceeded(_)))
    ));

    let team = svc.teams.create_team(other, new_team("others")).await.unwrap();
    let added = svc
        .teams
        .add_members_batch(
            other,
            team.id(),
            vec![MemberRoles {
                user_id: owner,
                roles: roles([TeamRole::Designer]),
            }],
        )
        .await;
    assert!(matches!(
        added,
        Err(ServiceError::Domain(DomainError::CapacityExceeded(_)))
    ));
}

#[tokio::test]
async fn test_duplicate_team_name_is_rejected() {
    let svc = services();
    let owner = seed_user(&svc.store, "namer").await;

    svc.teams.create_team(owner, new_team("unique")).await.unwrap();
    let again = svc.teams.create_team(owner, new_team("unique")).await;

    assert!(matches!(again, Err(ServiceError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_deleting_team_removes_its_projects() {
    let svc = services();
    let owner = seed_user(&svc.store, "owner").await;
    let team = svc.teams.create_team(owner, new_team("doomed")).await.unwrap();
    let project = svc
        .projects
        .create_project(owner, new_project("orphan", team.id()))
        .await
        .unwrap();

    svc.teams.delete_team(owner, team.id()).await.unwrap();

    assert!(matches!(
        svc.projects.get_project(project.id()).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_member_can_leave_but_not_remove_others() {
    let svc = services();
    let owner = seed_user(&svc.store, "owner").await;
    let a = seed_user(&svc.store, "member_a").await;
    let b = seed_user(&svc.store, "member_b").await;

    let team = svc.teams.create_team(owner, new_team("leavers")).await.unwrap();
    svc.teams
        .add_members_batch(
            owner,
            team.id(),
            vec![
                MemberRoles {
                    user_id: a,
                    roles: roles([TeamRole::Designer]),
                },
                MemberRoles {
                    user_id: b,
                    roles: roles([TeamRole::FrontendDeveloper]),
                },
            ],
        )
        .await
        .unwrap();

    let denied = svc.teams.remove_members_batch(a, team.id(), vec![b]).await;
    assert!(matches!(denied, Err(ServiceError::AccessDenied(_))));

    let team = svc
        .teams
        .remove_members_batch(a, team.id(), vec![a])
        .await
        .unwrap();
    assert!(!team.is_member(a));
    assert!(team.is_member(b));
}

#[tokio::test]
async fn test_team_owner_cannot_delete_account() {
    let svc = services();
    let owner = seed_user(&svc.store, "owner").await;
    let loner = seed_user(&svc.store, "loner").await;
    svc.teams.create_team(owner, new_team("anchor")).await.unwrap();

    let blocked = svc.users.delete_user(owner, owner).await;
    assert!(matches!(
        blocked,
        Err(ServiceError::Domain(DomainError::ForbiddenOperation(_)))
    ));

    let someone_else = svc.users.delete_user(owner, loner).await;
    assert!(matches!(someone_else, Err(ServiceError::AccessDenied(_))));

    svc.users.delete_user(loner, loner).await.unwrap();
    assert!(matches!(
        svc.users.get_user(loner).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_status_changes_are_admin_only() {
    let svc = services();
    let user = seed_user(&svc.store, "regular").await;
    let admin = seed_admin(&svc.store, "admin").await;

    let changes = UserChanges {
        status: Some(UserStatus::LookingForProject),
        ..UserChanges::default()
    };
    let denied = svc.users.update_user(user, user, changes.clone()).await;
    assert!(matches!(denied, Err(ServiceError::AccessDenied(_))));

    let updated = svc.users.update_user(admin, user, changes).await.unwrap();
    assert_eq!(updated.status(), UserStatus::LookingForProject);

    let banned = svc.users.ban_user(admin, user).await.unwrap();
    assert!(banned.is_banned());
    assert!(matches!(
        svc.users.ban_user(user, admin).await,
        Err(ServiceError::AccessDenied(_))
    ));
}

#[tokio::test]
async fn test_desired_projects_are_owner_scoped() {
    let svc = services_with(MembershipPolicy {
        max_desired_projects_per_user: 1,
        ..MembershipPolicy::default()
    });
    let owner = seed_user(&svc.store, "dreamer").await;
    let stranger = seed_user(&svc.store, "stranger").await;

    let posting = NewDesiredProject {
        description: "Looking for a Rust backend to join".to_string(),
        technologies: BTreeSet::from([Technology::Rust]),
        amount_of_people: Some(3),
    };
    let desired = svc.desired.create(owner, posting.clone()).await.unwrap();

    assert!(matches!(
        svc.desired.create(owner, posting).await,
        Err(ServiceError::Domain(DomainError::CapacityExceeded(_)))
    ));
    assert!(matches!(
        svc.desired
            .add_technology(stranger, desired.id(), Technology::Go)
            .await,
        Err(ServiceError::AccessDenied(_))
    ));

    let desired = svc
        .desired
        .update(owner, desired.id(), None, Some(5))
        .await
        .unwrap();
    assert_eq!(desired.amount_of_people(), Some(5));
    assert_eq!(svc.desired.list_own(owner).await.unwrap().len(), 1);

    svc.desired.delete(owner, desired.id()).await.unwrap();
    assert!(svc.desired.list_own(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_login_refresh_flow() {
    let store = MemoryStore::new();
    let uow: Arc<dyn UnitOfWorkFactory> = Arc::new(store);
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptPasswordHasher::new(4));
    let tokens: Arc<dyn TokenService> = Arc::new(JwtService::new(
        "test-secret",
        Duration::minutes(30),
        Duration::days(7),
    ));
    let auth = AuthService::new(uow, hasher, tokens);

    let pair = auth
        .register(
            "ferris".to_string(),
            "Ferris@Example.com".to_string(),
            "crabby-password".to_string(),
        )
        .await
        .unwrap();
    let user = auth.authenticate(&pair.access_token).await.unwrap();
    assert_eq!(user.username(), "ferris");
    assert_eq!(user.email().as_str(), "ferris@example.com");

    let duplicate = auth
        .register(
            "ferris2".to_string(),
            "ferris@example.com".to_string(),
            "crabby-password".to_string(),
        )
        .await;
    assert!(matches!(duplicate, Err(ServiceError::AlreadyExists(_))));

    let wrong = auth.login("ferris@example.com", "nope-nope".to_string()).await;
    assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));

    let login = auth
        .login("ferris@example.com", "crabby-password".to_string())
        .await
        .unwrap();

    // Access tokens are not accepted where a refresh token is expected
    assert!(matches!(
        auth.refresh_access_token(&login.access_token).await,
        Err(ServiceError::InvalidToken)
    ));
    let refreshed = auth.refresh_access_token(&login.refresh_token).await.unwrap();
    assert_eq!(refreshed.refresh_token, login.refresh_token);
    assert_eq!(
        auth.authenticate(&refreshed.access_token).await.unwrap().id(),
        user.id()
    );
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let uow: Arc<dyn UnitOfWorkFactory> = Arc::new(MemoryStore::new());
    let auth = AuthService::new(
        uow,
        Arc::new(BcryptPasswordHasher::new(4)),
        Arc::new(JwtService::new(
            "test-secret",
            Duration::minutes(30),
            Duration::days(7),
        )),
    );

    let result = auth
        .register("shorty".to_string(), "shorty@example.com".to_string(), "short".to_string())
        .await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
}
