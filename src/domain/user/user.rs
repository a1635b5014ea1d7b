use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{Email, PlatformRole, UserStatus};
use crate::domain::errors::{DomainError, DomainResult};

/// Profile changes for [`User::update_profile`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

/// User aggregate root
///
/// # Invariants
/// - Username is 3 to 50 characters of letters, digits, `_`, `-` or `.`
/// - Email is valid (see [`Email`])
/// - At least one platform role
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: Uuid,
    username: String,
    email: Email,
    password_hash: String,
    avatar: Option<String>,
    github: Option<String>,
    linkedin: Option<String>,
    status: UserStatus,
    platform_roles: BTreeSet<PlatformRole>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Registers a new user: status Active, role DeveloperUser
    ///
    /// # Example
    /// ```
    /// use devcollab_api::domain::user::{Email, PlatformRole, User, UserStatus};
    ///
    /// let email = Email::new("ada@example.com").unwrap();
    /// let user = User::new("ada".to_string(), email, "$2b$04$hash".to_string()).unwrap();
    ///
    /// assert_eq!(user.status(), UserStatus::Active);
    /// assert!(user.has_role(PlatformRole::DeveloperUser));
    /// ```
    pub fn new(username: String, email: Email, password_hash: String) -> DomainResult<Self> {
        let username = validate_username(username)?;

        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            avatar: None,
            github: None,
            linkedin: None,
            status: UserStatus::Active,
            platform_roles: BTreeSet::from([PlatformRole::DeveloperUser]),
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a User from persistence layer data
    ///
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        username: String,
        email: Email,
        password_hash: String,
        avatar: Option<String>,
        github: Option<String>,
        linkedin: Option<String>,
        status: UserStatus,
        platform_roles: BTreeSet<PlatformRole>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            avatar,
            github,
            linkedin,
            status,
            platform_roles,
            created_at,
        }
    }

    pub fn update_profile(&mut self, changes: ProfileChanges) -> DomainResult<()> {
        let username = changes.username.map(validate_username).transpose()?;

        if let Some(username) = username {
            self.username = username;
        }
        if let Some(avatar) = changes.avatar {
            self.avatar = Some(avatar);
        }
        if let Some(github) = changes.github {
            self.github = Some(github);
        }
        if let Some(linkedin) = changes.linkedin {
            self.linkedin = Some(linkedin);
        }
        Ok(())
    }

    pub fn change_email(&mut self, email: Email) {
        self.email = email;
    }

    pub fn change_status(&mut self, status: UserStatus) {
        self.status = status;
    }

    pub fn ban(&mut self) -> DomainResult<()> {
        if self.is_banned() {
            return Err(DomainError::InvalidTransition(
                "User is already banned".to_string(),
            ));
        }
        self.status = UserStatus::Banned;
        Ok(())
    }

    pub fn set_platform_roles(&mut self, roles: BTreeSet<PlatformRole>) -> DomainResult<()> {
        if roles.is_empty() {
            return Err(DomainError::InvalidRoleSet(
                "A user must hold at least one platform role".to_string(),
            ));
        }
        self.platform_roles = roles;
        Ok(())
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }

    pub fn has_role(&self, role: PlatformRole) -> bool {
        self.platform_roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(PlatformRole::Admin)
    }

    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn github(&self) -> Option<&str> {
        self.github.as_deref()
    }

    pub fn linkedin(&self) -> Option<&str> {
        self.linkedin.as_deref()
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn platform_roles(&self) -> &BTreeSet<PlatformRole> {
        &self.platform_roles
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_username(username: String) -> DomainResult<String> {
    let username = username.trim().to_string();
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(DomainError::Validation(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(DomainError::Validation(
            "Username may only contain letters, digits, '_', '-' and '.'".to_string(),
        ));
    }
    Ok(username)
}
