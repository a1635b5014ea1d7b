use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::roster::RosterRole;

/// Role a participant holds inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    /// Project manager, exactly one per project
    Manager,
    Developer,
    Qa,
    Designer,
}

impl ProjectRole {
    pub const ALL: [ProjectRole; 4] = [
        ProjectRole::Manager,
        ProjectRole::Developer,
        ProjectRole::Qa,
        ProjectRole::Designer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Manager => "manager",
            ProjectRole::Developer => "developer",
            ProjectRole::Qa => "qa",
            ProjectRole::Designer => "designer",
        }
    }
}

impl RosterRole for ProjectRole {
    const PRIVILEGED: Self = ProjectRole::Manager;
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown project role: {s}")))
    }
}

/// Represents the lifecycle status of a project
///
/// # Status Transitions
/// ```text
/// Active <-> Frozen <-> Paused      (any non-terminal status to any other)
///    └------------------------> Completed   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project is being worked on
    Active,
    /// Project is frozen, usually after its team changed
    Frozen,
    /// Project is temporarily paused
    Paused,
    /// Project is finished; no further transitions
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Active,
        ProjectStatus::Frozen,
        ProjectStatus::Paused,
        ProjectStatus::Completed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed)
    }

    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Any non-terminal status to any different status
    ///
    /// # Example
    /// ```
    /// use devcollab_api::domain::project::ProjectStatus;
    ///
    /// assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Completed));
    /// assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Active));
    /// assert!(!ProjectStatus::Paused.can_transition_to(ProjectStatus::Paused));
    /// ```
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        !self.is_terminal() && *self != next
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Frozen => "frozen",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown project status: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_active_to_paused() {
        assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Paused));
    }

    #[test]
    fn valid_transition_frozen_to_active() {
        assert!(ProjectStatus::Frozen.can_transition_to(ProjectStatus::Active));
    }

    #[test]
    fn valid_transition_paused_to_completed() {
        assert!(ProjectStatus::Paused.can_transition_to(ProjectStatus::Completed));
    }

    #[test]
    fn invalid_transition_to_same_status() {
        for status in ProjectStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn invalid_transition_completed_to_anything() {
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Active));
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Frozen));
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Paused));
    }

    #[test]
    fn status_display() {
        assert_eq!(ProjectStatus::Active.to_string(), "active");
        assert_eq!(ProjectStatus::Frozen.to_string(), "frozen");
        assert_eq!(ProjectStatus::Paused.to_string(), "paused");
        assert_eq!(ProjectStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn manager_is_privileged() {
        assert_eq!(ProjectRole::PRIVILEGED, ProjectRole::Manager);
    }

    #[test]
    fn role_text_round_trip() {
        for role in ProjectRole::ALL {
            assert_eq!(role.as_str().parse::<ProjectRole>().unwrap(), role);
        }
        assert!("owner".parse::<ProjectRole>().is_err());
    }
}
