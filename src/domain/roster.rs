// Role roster shared by the Team and Project aggregates.
// Owns the user -> role-set map and every rule about it; aggregates only
// choose the limits and the wording.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use uuid::Uuid;

use super::errors::{DomainError, DomainResult};

/// A role vocabulary with one privileged role held by exactly one entry.
pub trait RosterRole: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// OWNER for teams, MANAGER for projects.
    const PRIVILEGED: Self;
}

/// Bounds applied by a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterLimits {
    /// Maximum number of entries, including the privileged holder
    pub max_entries: usize,
    /// Maximum roles an entry may reach through incremental assignment
    pub max_roles_assigned: Option<usize>,
    /// Maximum roles an entry may receive through a bulk set
    pub max_roles_set: Option<usize>,
    /// "member" or "participant", used in error messages
    pub noun: &'static str,
}

/// One user's seat in a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry<R: RosterRole> {
    user_id: Uuid,
    roles: BTreeSet<R>,
}

impl<R: RosterRole> RosterEntry<R> {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Read-only view of the roles held by this entry
    pub fn roles(&self) -> &BTreeSet<R> {
        &self.roles
    }

    pub fn has_role(&self, role: R) -> bool {
        self.roles.contains(&role)
    }

    fn is_privileged(&self) -> bool {
        self.roles.contains(&R::PRIVILEGED)
    }
}

/// Membership map keyed by user id.
///
/// # Invariants
/// - Never empty
/// - Exactly one entry holds `R::PRIVILEGED`
/// - No entry has an empty role set
/// - Entry count never exceeds `limits.max_entries`
///
/// Every mutating method validates fully before touching the map, so a
/// failed call leaves the roster unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster<R: RosterRole> {
    entries: BTreeMap<Uuid, RosterEntry<R>>,
    limits: RosterLimits,
}

impl<R: RosterRole> Roster<R> {
    /// Creates a roster whose only entry is `holder` with the privileged role.
    pub fn seeded(holder: Uuid, limits: RosterLimits) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            holder,
            RosterEntry {
                user_id: holder,
                roles: BTreeSet::from([R::PRIVILEGED]),
            },
        );
        Self { entries, limits }
    }

    /// Rebuilds a roster from stored rows without re-running validation.
    pub fn from_persistence(
        rows: impl IntoIterator<Item = (Uuid, BTreeSet<R>)>,
        limits: RosterLimits,
    ) -> Self {
        let entries = rows
            .into_iter()
            .map(|(user_id, roles)| (user_id, RosterEntry { user_id, roles }))
            .collect();
        Self { entries, limits }
    }

    pub fn get(&self, user_id: Uuid) -> Option<&RosterEntry<R>> {
        self.entries.get(&user_id)
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.entries.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry<R>> {
        self.entries.values()
    }

    /// The user holding the privileged role
    pub fn privileged_holder(&self) -> Option<Uuid> {
        self.entries
            .values()
            .find(|entry| entry.is_privileged())
            .map(|entry| entry.user_id)
    }

    /// True if `user_id` is present and holds at least one of `roles`
    pub fn holds_any(&self, user_id: Uuid, roles: &[R]) -> bool {
        self.entries
            .get(&user_id)
            .map(|entry| roles.iter().any(|role| entry.has_role(*role)))
            .unwrap_or(false)
    }

    /// Snapshot of user id -> roles, the shape repositories persist
    pub fn role_map(&self) -> BTreeMap<Uuid, BTreeSet<R>> {
        self.entries
            .iter()
            .map(|(user_id, entry)| (*user_id, entry.roles.clone()))
            .collect()
    }

    /// Adds a non-privileged entry with its initial roles
    ///
    /// The initial set is bounded like a bulk [`Roster::set`]: at most
    /// `max_roles_set` roles when the limit is present.
    pub fn add(&mut self, user_id: Uuid, roles: BTreeSet<R>) -> DomainResult<()> {
        let noun = self.limits.noun;
        if self.entries.contains_key(&user_id) {
            return Err(DomainError::DuplicateMember(user_id));
        }
        if roles.is_empty() {
            return Err(DomainError::InvalidRoleSet(format!(
                "cannot add a {noun} with no roles"
            )));
        }
        if roles.contains(&R::PRIVILEGED) {
            return Err(DomainError::InvalidRoleSet(format!(
                "cannot add another {}",
                R::PRIVILEGED
            )));
        }
        if let Some(max) = self.limits.max_roles_set {
            if roles.len() > max {
                return Err(DomainError::InvalidRoleSet(format!(
                    "a {noun} can hold at most {max} roles"
                )));
            }
        }
        if self.entries.len() >= self.limits.max_entries {
            return Err(DomainError::CapacityExceeded(format!(
                "cannot have more than {} {noun}s",
                self.limits.max_entries
            )));
        }

        self.entries.insert(user_id, RosterEntry { user_id, roles });
        Ok(())
    }

    pub fn remove(&mut self, user_id: Uuid) -> DomainResult<()> {
        let entry = self.require(user_id)?;
        if entry.is_privileged() {
            return Err(DomainError::ForbiddenOperation(format!(
                "the {} cannot be removed",
                R::PRIVILEGED
            )));
        }

        self.entries.remove(&user_id);
        Ok(())
    }

    /// Adds a role to an entry. Assigning a role the entry already holds is
    /// a no-op.
    pub fn assign(&mut self, user_id: Uuid, role: R) -> DomainResult<()> {
        let noun = self.limits.noun;
        let max_roles = self.limits.max_roles_assigned;
        let entry = self.require(user_id)?;
        if role == R::PRIVILEGED {
            return Err(DomainError::ForbiddenOperation(format!(
                "the {role} role cannot be assigned"
            )));
        }
        if entry.has_role(role) {
            return Ok(());
        }
        if let Some(max) = max_roles {
            if entry.roles.len() >= max {
                return Err(DomainError::CapacityExceeded(format!(
                    "a {noun} can hold at most {max} roles"
                )));
            }
        }

        self.require_mut(user_id)?.roles.insert(role);
        Ok(())
    }

    pub fn revoke(&mut self, user_id: Uuid, role: R) -> DomainResult<()> {
        let noun = self.limits.noun;
        let entry = self.require(user_id)?;
        if role == R::PRIVILEGED {
            return Err(DomainError::ForbiddenOperation(format!(
                "the {role} role cannot be revoked"
            )));
        }
        if !entry.has_role(role) {
            return Err(DomainError::NotFound(format!(
                "{noun} {user_id} does not hold the {role} role"
            )));
        }
        if entry.roles.len() == 1 {
            return Err(DomainError::ForbiddenOperation(format!(
                "a {noun} must keep at least one role"
            )));
        }

        self.require_mut(user_id)?.roles.remove(&role);
        Ok(())
    }

    /// Replaces an entry's whole role set.
    pub fn set(&mut self, user_id: Uuid, roles: BTreeSet<R>) -> DomainResult<()> {
        let noun = self.limits.noun;
        let entry = self.require(user_id)?;
        if entry.is_privileged() || roles.contains(&R::PRIVILEGED) {
            return Err(DomainError::ForbiddenOperation(format!(
                "the {} role cannot be changed through a bulk set",
                R::PRIVILEGED
            )));
        }
        if roles.is_empty() {
            return Err(DomainError::InvalidRoleSet(format!(
                "a {noun} must have at least one role"
            )));
        }
        if let Some(max) = self.limits.max_roles_set {
            if roles.len() > max {
                return Err(DomainError::InvalidRoleSet(format!(
                    "a {noun} can hold at most {max} roles"
                )));
            }
        }

        self.require_mut(user_id)?.roles = roles;
        Ok(())
    }

    fn require(&self, user_id: Uuid) -> DomainResult<&RosterEntry<R>> {
        self.entries.get(&user_id).ok_or_else(|| {
            DomainError::NotFound(format!("{} {user_id}", self.limits.noun))
        })
    }

    fn require_mut(&mut self, user_id: Uuid) -> DomainResult<&mut RosterEntry<R>> {
        let noun = self.limits.noun;
        self.entries
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::NotFound(format!("{noun} {user_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Seat {
        Captain,
        Gunner,
        Navigator,
        Cook,
    }

    impl fmt::Display for Seat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl RosterRole for Seat {
        const PRIVILEGED: Self = Seat::Captain;
    }

    const LIMITS: RosterLimits = RosterLimits {
        max_entries: 3,
        max_roles_assigned: Some(2),
        max_roles_set: Some(3),
        noun: "crew member",
    };

    fn roster() -> (Roster<Seat>, Uuid) {
        let captain = Uuid::new_v4();
        (Roster::seeded(captain, LIMITS), captain)
    }

    fn privileged_count(roster: &Roster<Seat>) -> usize {
        roster.entries().filter(|e| e.has_role(Seat::Captain)).count()
    }

    #[test]
    fn seeded_roster_has_single_privileged_holder() {
        let (roster, captain) = roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.privileged_holder(), Some(captain));
    }

    #[test]
    fn add_rejects_duplicates_before_roles() {
        let (mut roster, captain) = roster();
        let err = roster.add(captain, BTreeSet::new()).unwrap_err();
        assert_eq!(err, DomainError::DuplicateMember(captain));
    }

    #[test]
    fn add_rejects_privileged_role() {
        let (mut roster, _) = roster();
        let err = roster
            .add(Uuid::new_v4(), BTreeSet::from([Seat::Captain]))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRoleSet(_)));
        assert_eq!(privileged_count(&roster), 1);
    }

    #[test]
    fn add_bounds_initial_roles_like_set() {
        let mut roster = Roster::seeded(
            Uuid::new_v4(),
            RosterLimits {
                max_roles_set: Some(2),
                ..LIMITS
            },
        );

        let err = roster
            .add(
                Uuid::new_v4(),
                BTreeSet::from([Seat::Gunner, Seat::Navigator, Seat::Cook]),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRoleSet(_)));
        assert_eq!(roster.len(), 1);

        roster
            .add(Uuid::new_v4(), BTreeSet::from([Seat::Gunner, Seat::Cook]))
            .unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn add_respects_capacity() {
        let (mut roster, _) = roster();
        roster.add(Uuid::new_v4(), BTreeSet::from([Seat::Cook])).unwrap();
        roster.add(Uuid::new_v4(), BTreeSet::from([Seat::Cook])).unwrap();

        let err = roster
            .add(Uuid::new_v4(), BTreeSet::from([Seat::Cook]))
            .unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded(_)));
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn assign_is_idempotent_and_bounded() {
        let (mut roster, _) = roster();
        let sailor = Uuid::new_v4();
        roster.add(sailor, BTreeSet::from([Seat::Cook])).unwrap();

        roster.assign(sailor, Seat::Cook).unwrap();
        roster.assign(sailor, Seat::Gunner).unwrap();
        assert_eq!(roster.get(sailor).unwrap().roles().len(), 2);

        let err = roster.assign(sailor, Seat::Navigator).unwrap_err();
        assert!(matches!(err, DomainError::CapacityExceeded(_)));
        assert_eq!(roster.get(sailor).unwrap().roles().len(), 2);
    }

    #[test]
    fn assign_privileged_role_is_forbidden() {
        let (mut roster, _) = roster();
        let sailor = Uuid::new_v4();
        roster.add(sailor, BTreeSet::from([Seat::Cook])).unwrap();

        let err = roster.assign(sailor, Seat::Captain).unwrap_err();
        assert!(matches!(err, DomainError::ForbiddenOperation(_)));
        assert_eq!(privileged_count(&roster), 1);
    }

    #[test]
    fn revoke_unheld_role_is_not_found() {
        let (mut roster, _) = roster();
        let sailor = Uuid::new_v4();
        roster
            .add(sailor, BTreeSet::from([Seat::Cook, Seat::Gunner]))
            .unwrap();

        let err = roster.revoke(sailor, Seat::Navigator).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn set_cannot_touch_privileged_role() {
        let (mut roster, _) = roster();
        let sailor = Uuid::new_v4();
        roster.add(sailor, BTreeSet::from([Seat::Cook])).unwrap();

        let err = roster
            .set(
                sailor,
                BTreeSet::from([Seat::Cook, Seat::Gunner, Seat::Navigator, Seat::Captain]),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::ForbiddenOperation(_)));

        roster
            .set(sailor, BTreeSet::from([Seat::Gunner, Seat::Navigator]))
            .unwrap();
        assert!(roster.holds_any(sailor, &[Seat::Navigator]));
        assert!(!roster.holds_any(sailor, &[Seat::Cook]));
    }

    #[test]
    fn role_map_round_trips_through_persistence() {
        let (mut roster, _) = roster();
        roster
            .add(Uuid::new_v4(), BTreeSet::from([Seat::Gunner]))
            .unwrap();

        let rebuilt = Roster::from_persistence(roster.role_map(), LIMITS);
        assert_eq!(rebuilt, roster);
    }
}
