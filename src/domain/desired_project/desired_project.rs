use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::tech_profile::{TechProfile, Technology};

/// A user's posting describing a project they would like to join or start
///
/// # Invariants
/// - `amount_of_people`, when set, is at least 1
/// - The tech profile is always a validated snapshot
#[derive(Debug, Clone)]
pub struct DesiredProject {
    id: Uuid,
    owner_id: Uuid,
    amount_of_people: Option<u32>,
    tech_profile: TechProfile,
    created_at: DateTime<Utc>,
}

impl DesiredProject {
    pub fn new(
        owner_id: Uuid,
        tech_profile: TechProfile,
        amount_of_people: Option<u32>,
    ) -> DomainResult<Self> {
        validate_amount(amount_of_people)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            amount_of_people,
            tech_profile,
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a DesiredProject from persistence layer data
    pub fn from_persistence(
        id: Uuid,
        owner_id: Uuid,
        amount_of_people: Option<u32>,
        tech_profile: TechProfile,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            amount_of_people,
            tech_profile,
            created_at,
        }
    }

    /// Partial update; `None` leaves a field unchanged
    pub fn update(
        &mut self,
        description: Option<String>,
        amount_of_people: Option<u32>,
    ) -> DomainResult<()> {
        validate_amount(amount_of_people)?;
        let tech_profile = description
            .map(|description| self.tech_profile.with_description(description))
            .transpose()?;

        if let Some(tech_profile) = tech_profile {
            self.tech_profile = tech_profile;
        }
        if amount_of_people.is_some() {
            self.amount_of_people = amount_of_people;
        }
        Ok(())
    }

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

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn amount_of_people(&self) -> Option<u32> {
        self.amount_of_people
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

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_amount(amount_of_people: Option<u32>) -> DomainResult<()> {
    if amount_of_people == Some(0) {
        return Err(DomainError::Validation(
            "Desired amount of people must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> DesiredProject {
        let profile = TechProfile::new(
            "Looking for a mobile side project",
            BTreeSet::from([Technology::Kotlin, Technology::Swift]),
        )
        .unwrap();
        DesiredProject::new(Uuid::new_v4(), profile, Some(3)).unwrap()
    }

    #[test]
    fn zero_people_is_rejected() {
        let profile =
            TechProfile::new("Anything with Rust", BTreeSet::from([Technology::Rust])).unwrap();
        let result = DesiredProject::new(Uuid::new_v4(), profile, Some(0));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn update_is_partial() {
        let mut posting = posting();
        posting.update(None, Some(5)).unwrap();

        assert_eq!(posting.amount_of_people(), Some(5));
        assert_eq!(posting.description(), "Looking for a mobile side project");
    }

    #[test]
    fn failed_update_changes_nothing() {
        let mut posting = posting();
        let result = posting.update(Some("short".to_string()), Some(6));

        assert!(result.is_err());
        assert_eq!(posting.amount_of_people(), Some(3));
    }

    #[test]
    fn technologies_go_through_profile() {
        let mut posting = posting();
        posting.remove_technology(Technology::Swift).unwrap();
        assert!(posting.remove_technology(Technology::Kotlin).is_err());
        assert!(posting.add_technology(Technology::Kotlin).is_err());
        assert_eq!(posting.technologies(), &BTreeSet::from([Technology::Kotlin]));
    }
}
