use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{ProjectRole, ProjectStatus};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::roster::{Roster, RosterEntry, RosterLimits};
use crate::domain::tech_profile::{TechProfile, Technology};

/// Maximum number of participants in a project, manager included
pub const MAX_PARTICIPANTS: usize = 10;
/// Roles a participant may reach through incremental assignment
pub const MAX_ASSIGNED_ROLES: usize = 4;
/// Roles a participant may receive through a bulk set
pub const MAX_SET_ROLES: usize = 5;

const PROJECT_ROSTER: RosterLimits = RosterLimits {
    max_entries: MAX_PARTICIPANTS,
    max_roles_assigned: Some(MAX_ASSIGNED_ROLES),
    max_roles_set: Some(MAX_SET_ROLES),
    noun: "participant",
};

pub type ProjectParticipant = RosterEntry<ProjectRole>;

/// Field changes for [`Project::update`]; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub url: Option<String>,
}

/// Project aggregate root
///
/// Owned by a team (`team_id`), run by a single manager.
///
/// # Invariants
/// - Name is 3 to 100 characters
/// - Exactly one participant holds `Manager`
/// - No participant has an empty role set
/// - At most [`MAX_PARTICIPANTS`] participants
/// - The tech profile is always a validated snapshot
/// - `Completed` is terminal
#[derive(Debug, Clone)]
pub struct Project {
    id: Uuid,
    name: String,
    team_id: Uuid,
    status: ProjectStatus,
    tech_profile: TechProfile,
    logo: Option<String>,
    url: Option<String>,
    participants: Roster<ProjectRole>,
    created_at: DateTime<Utc>,
}

impl Project {
    /// Creates an Active project with `manager_id` as its sole participant
    pub fn new(
        name: String,
        team_id: Uuid,
        manager_id: Uuid,
        tech_profile: TechProfile,
        logo: Option<String>,
        url: Option<String>,
    ) -> DomainResult<Self> {
        let name = validate_name(name)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            team_id,
            status: ProjectStatus::Active,
            tech_profile,
            logo,
            url,
            participants: Roster::seeded(manager_id, PROJECT_ROSTER),
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a Project from persistence layer data
    ///
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        team_id: Uuid,
        status: ProjectStatus,
        tech_profile: TechProfile,
        logo: Option<String>,
        url: Option<String>,
        participants: impl IntoIterator<Item = (Uuid, BTreeSet<ProjectRole>)>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            team_id,
            status,
            tech_profile,
            logo,
            url,
            participants: Roster::from_persistence(participants, PROJECT_ROSTER),
            created_at,
        }
    }

    /// Applies a partial update after validating every provided field
    pub fn update(&mut self, changes: ProjectChanges) -> DomainResult<()> {
        let name = changes.name.map(validate_name).transpose()?;
        let tech_profile = changes
            .description
            .map(|description| self.tech_profile.with_description(description))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(tech_profile) = tech_profile {
            self.tech_profile = tech_profile;
        }
        if let Some(logo) = changes.logo {
            self.logo = Some(logo);
        }
        if let Some(url) = changes.url {
            self.url = Some(url);
        }
        Ok(())
    }

    /// Moves the project to `new_status`
    ///
    /// # Errors
    /// `InvalidTransition` if the status is unchanged or the project is
    /// already completed.
    pub fn change_status(&mut self, new_status: ProjectStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidTransition(format!(
                "Cannot change project status from {} to {}",
                self.status, new_status
            )));
        }
        self.status = new_status;
        Ok(())
    }

    // ===== Technologies =====

    pub fn add_technology(&mut self, technology: Technology) -> DomainResult<()> {
        self.tech_profile = self.tech_profile.with_added(technology)?;
        Ok(())
    }

    pub fn remove_technology(&mut self, technology: Technology) -> DomainResult<()> {
        self.tech_profile = self.tech_profile.with_removed(technology)?;
        Ok(())
    }

    pub fn set_technologies(&mut self, technologies: BTreeSet<Technology>) -> DomainResult<()> {
        self.tech_profile = self.tech_profile.with_technologies(technologies)?;
        Ok(())
    }

    pub fn change_description(&mut self, description: impl Into<String>) -> DomainResult<()> {
        self.tech_profile = self.tech_profile.with_description(description)?;
        Ok(())
    }

    // ===== Participants =====

    pub fn add_participant(
        &mut self,
        user_id: Uuid,
        roles: BTreeSet<ProjectRole>,
    ) -> DomainResult<()> {
        self.participants.add(user_id, roles)
    }

    pub fn remove_participant(&mut self, user_id: Uuid) -> DomainResult<()> {
        self.participants.remove(user_id)
    }

    /// Adds a role to a participant; the manager's role set is fixed
    pub fn assign_role_to_participant(
        &mut self,
        user_id: Uuid,
        role: ProjectRole,
    ) -> DomainResult<()> {
        if self.is_manager(user_id) {
            return Err(DomainError::ForbiddenOperation(
                "The project manager's roles cannot be extended".to_string(),
            ));
        }
        self.participants.assign(user_id, role)
    }

    pub fn revoke_role_from_participant(
        &mut self,
        user_id: Uuid,
        role: ProjectRole,
    ) -> DomainResult<()> {
        self.participants.revoke(user_id, role)
    }

    pub fn set_participant_roles(
        &mut self,
        user_id: Uuid,
        roles: BTreeSet<ProjectRole>,
    ) -> DomainResult<()> {
        self.participants.set(user_id, roles)
    }

    // ===== Queries =====

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(user_id)
    }

    pub fn is_manager(&self, user_id: Uuid) -> bool {
        self.participants.holds_any(user_id, &[ProjectRole::Manager])
    }

    pub fn is_manager_or_developer(&self, user_id: Uuid) -> bool {
        self.participants
            .holds_any(user_id, &[ProjectRole::Manager, ProjectRole::Developer])
    }

    pub fn manager_id(&self) -> Option<Uuid> {
        self.participants.privileged_holder()
    }

    pub fn get_participant(&self, user_id: Uuid) -> Option<&ProjectParticipant> {
        self.participants.get(user_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &ProjectParticipant> {
        self.participants.entries()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn roster(&self) -> &Roster<ProjectRole> {
        &self.participants
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team_id(&self) -> Uuid {
        self.team_id
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn tech_profile(&self) -> &TechProfile {
        &self.tech_profile
    }

    pub fn description(&self) -> &str {
        self.tech_profile.description()
    }

    pub fn technologies(&self) -> &BTreeSet<Technology> {
        self.tech_profile.technologies()
    }

    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    let len = name.chars().count();
    if !(3..=100).contains(&len) {
        return Err(DomainError::Validation(
            "Project name must be between 3 and 100 characters".to_string(),
        ));
    }
    Ok(name)
}
