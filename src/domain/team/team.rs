use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::TeamRole;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::roster::{Roster, RosterEntry, RosterLimits};

/// Maximum number of members in a single team, owner included
pub const MAX_TEAM_MEMBERS: usize = 20;

const TEAM_ROSTER: RosterLimits = RosterLimits {
    max_entries: MAX_TEAM_MEMBERS,
    max_roles_assigned: None,
    max_roles_set: None,
    noun: "member",
};

/// A team member and the roles they hold
pub type TeamMember = RosterEntry<TeamRole>;

/// Team aggregate root
///
/// Owns the membership map and every rule about it.
///
/// # Invariants
/// - Name is 3 to 50 characters
/// - At least one member
/// - Exactly one member holds `Owner`
/// - No member has an empty role set
/// - At most [`MAX_TEAM_MEMBERS`] members
///
/// # Example
/// ```
/// use devcollab_api::domain::team::{Team, TeamRole};
/// use std::collections::BTreeSet;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let mut team = Team::new("Rustaceans".to_string(), owner, None, None).expect("valid team");
///
/// let dev = Uuid::new_v4();
/// team.add_member(dev, BTreeSet::from([TeamRole::BackendDeveloper])).expect("added");
/// assert_eq!(team.owner_id(), Some(owner));
/// assert!(team.remove_member(owner).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Team {
    id: Uuid,
    name: String,
    description: Option<String>,
    logo: Option<String>,
    members: Roster<TeamRole>,
    created_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new Team with `owner_id` as its sole member
    ///
    /// # Returns
    /// * `Ok(Team)` - New team
    /// * `Err(DomainError::Validation)` - If the name is out of bounds
    pub fn new(
        name: String,
        owner_id: Uuid,
        description: Option<String>,
        logo: Option<String>,
    ) -> DomainResult<Self> {
        let name = validate_name(name)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            logo,
            members: Roster::seeded(owner_id, TEAM_ROSTER),
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses validation: stored state is assumed valid.
    /// Only to be used by repository implementations.
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: Option<String>,
        logo: Option<String>,
        members: impl IntoIterator<Item = (Uuid, BTreeSet<TeamRole>)>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            logo,
            members: Roster::from_persistence(members, TEAM_ROSTER),
            created_at,
        }
    }

    /// Applies a partial update. `None` leaves a field unchanged.
    ///
    /// The name is validated before any field is written.
    pub fn update(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        logo: Option<String>,
    ) -> DomainResult<()> {
        let name = name.map(validate_name).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = Some(description);
        }
        if let Some(logo) = logo {
            self.logo = Some(logo);
        }
        Ok(())
    }

    // ===== Membership =====

    /// Adds a member with the given roles
    ///
    /// # Errors
    /// - `DuplicateMember` if already a member
    /// - `InvalidRoleSet` if `roles` is empty or contains `Owner`
    /// - `CapacityExceeded` if the team is full
    pub fn add_member(&mut self, user_id: Uuid, roles: BTreeSet<TeamRole>) -> DomainResult<()> {
        self.members.add(user_id, roles)
    }

    /// Removes a non-owner member
    pub fn remove_member(&mut self, user_id: Uuid) -> DomainResult<()> {
        self.members.remove(user_id)
    }

    pub fn assign_role(&mut self, user_id: Uuid, role: TeamRole) -> DomainResult<()> {
        self.members.assign(user_id, role)
    }

    /// Revokes a role; the owner role and a member's last role are kept
    pub fn revoke_role(&mut self, user_id: Uuid, role: TeamRole) -> DomainResult<()> {
        self.members.revoke(user_id, role)
    }

    /// Replaces a non-owner member's role set
    pub fn set_member_roles(
        &mut self,
        user_id: Uuid,
        roles: BTreeSet<TeamRole>,
    ) -> DomainResult<()> {
        self.members.set(user_id, roles)
    }

    // ===== Queries =====

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(user_id)
    }

    /// Authorization predicate checked before any mutating service call
    pub fn is_owner_or_maintainer(&self, user_id: Uuid) -> bool {
        self.members
            .holds_any(user_id, &[TeamRole::Owner, TeamRole::Maintainer])
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.members.privileged_holder()
    }

    pub fn get_member(&self, user_id: Uuid) -> Option<&TeamMember> {
        self.members.get(user_id)
    }

    /// Read-only view of the membership
    pub fn members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.entries()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn roster(&self) -> &Roster<TeamRole> {
        &self.members
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn logo(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    let name = name.trim().to_string();
    let len = name.chars().count();
    if !(3..=50).contains(&len) {
        return Err(DomainError::Validation(
            "Team name must be between 3 and 50 characters".to_string(),
        ));
    }
    Ok(name)
}
