use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Maximum number of technologies in a stack
pub const MAX_TECHNOLOGIES: usize = 10;

/// Minimum description length, in characters
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Technology that can appear in a project's stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    Python,
    Rust,
    Go,
    Java,
    Kotlin,
    Swift,
    Csharp,
    Javascript,
    Typescript,
    React,
    Vue,
    Angular,
    Django,
    Fastapi,
    Postgresql,
    Redis,
    Docker,
    Kubernetes,
}

impl Technology {
    pub const ALL: [Technology; 18] = [
        Technology::Python,
        Technology::Rust,
        Technology::Go,
        Technology::Java,
        Technology::Kotlin,
        Technology::Swift,
        Technology::Csharp,
        Technology::Javascript,
        Technology::Typescript,
        Technology::React,
        Technology::Vue,
        Technology::Angular,
        Technology::Django,
        Technology::Fastapi,
        Technology::Postgresql,
        Technology::Redis,
        Technology::Docker,
        Technology::Kubernetes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Python => "python",
            Technology::Rust => "rust",
            Technology::Go => "go",
            Technology::Java => "java",
            Technology::Kotlin => "kotlin",
            Technology::Swift => "swift",
            Technology::Csharp => "csharp",
            Technology::Javascript => "javascript",
            Technology::Typescript => "typescript",
            Technology::React => "react",
            Technology::Vue => "vue",
            Technology::Angular => "angular",
            Technology::Django => "django",
            Technology::Fastapi => "fastapi",
            Technology::Postgresql => "postgresql",
            Technology::Redis => "redis",
            Technology::Docker => "docker",
            Technology::Kubernetes => "kubernetes",
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technology {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technology::ALL
            .into_iter()
            .find(|tech| tech.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown technology: {s}")))
    }
}

/// Tech profile value object: a description plus a technology stack
///
/// Immutable. Every transformation validates and returns a new profile, so a
/// holder only ever swaps one valid snapshot for another.
///
/// # Invariants
/// - Description is at least [`MIN_DESCRIPTION_LEN`] characters
/// - Between 1 and [`MAX_TECHNOLOGIES`] technologies
///
/// # Example
/// ```
/// use devcollab_api::domain::tech_profile::{TechProfile, Technology};
/// use std::collections::BTreeSet;
///
/// let profile = TechProfile::new(
///     "A data pipeline for events",
///     BTreeSet::from([Technology::Python]),
/// ).expect("valid profile");
///
/// assert!(profile.with_removed(Technology::Python).is_err());
///
/// let profile = profile.with_added(Technology::React).expect("added");
/// let profile = profile.with_removed(Technology::Python).expect("removed");
/// assert_eq!(profile.technologies(), &BTreeSet::from([Technology::React]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechProfile {
    description: String,
    technologies: BTreeSet<Technology>,
}

impl TechProfile {
    /// Creates a validated tech profile
    pub fn new(
        description: impl Into<String>,
        technologies: BTreeSet<Technology>,
    ) -> DomainResult<Self> {
        let description = description.into();
        validate_description(&description)?;
        validate_technologies(&technologies)?;
        Ok(Self {
            description,
            technologies,
        })
    }

    /// Rebuilds a stored profile without re-running validation.
    pub fn from_persistence(description: String, technologies: BTreeSet<Technology>) -> Self {
        Self {
            description,
            technologies,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn technologies(&self) -> &BTreeSet<Technology> {
        &self.technologies
    }

    pub fn with_added(&self, technology: Technology) -> DomainResult<Self> {
        if self.technologies.contains(&technology) {
            return Err(DomainError::Validation(format!(
                "Technology {technology} is already in the stack"
            )));
        }
        let mut technologies = self.technologies.clone();
        technologies.insert(technology);
        Self::new(self.description.clone(), technologies)
    }

    pub fn with_removed(&self, technology: Technology) -> DomainResult<Self> {
        if self.technologies.len() <= 1 {
            return Err(DomainError::Validation(
                "The stack must keep at least one technology".to_string(),
            ));
        }
        if !self.technologies.contains(&technology) {
            return Err(DomainError::NotFound(format!(
                "Technology {technology} is not in the stack"
            )));
        }
        let technologies = self
            .technologies
            .iter()
            .copied()
            .filter(|t| *t != technology)
            .collect();
        Self::new(self.description.clone(), technologies)
    }

    pub fn with_technologies(&self, technologies: BTreeSet<Technology>) -> DomainResult<Self> {
        Self::new(self.description.clone(), technologies)
    }

    pub fn with_description(&self, description: impl Into<String>) -> DomainResult<Self> {
        Self::new(description, self.technologies.clone())
    }
}

fn validate_description(description: &str) -> DomainResult<()> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(DomainError::Validation(format!(
            "Description must be at least {MIN_DESCRIPTION_LEN} characters long"
        )));
    }
    Ok(())
}

fn validate_technologies(technologies: &BTreeSet<Technology>) -> DomainResult<()> {
    if technologies.is_empty() {
        return Err(DomainError::Validation(
            "Technologies must not be empty".to_string(),
        ));
    }
    if technologies.len() > MAX_TECHNOLOGIES {
        return Err(DomainError::Validation(format!(
            "A stack cannot have more than {MAX_TECHNOLOGIES} technologies"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = "Realtime chat for study groups";

    fn stack(items: &[Technology]) -> BTreeSet<Technology> {
        items.iter().copied().collect()
    }

    #[test]
    fn new_profile_requires_description_length() {
        let result = TechProfile::new("short", stack(&[Technology::Rust]));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn new_profile_requires_technologies() {
        let result = TechProfile::new(DESCRIPTION, BTreeSet::new());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn new_profile_caps_technologies() {
        let eleven: BTreeSet<_> = Technology::ALL.into_iter().take(11).collect();
        assert!(TechProfile::new(DESCRIPTION, eleven).is_err());

        let ten: BTreeSet<_> = Technology::ALL.into_iter().take(10).collect();
        assert!(TechProfile::new(DESCRIPTION, ten).is_ok());
    }

    #[test]
    fn adding_duplicate_fails_and_keeps_original() {
        let profile = TechProfile::new(DESCRIPTION, stack(&[Technology::Go])).unwrap();

        assert!(profile.with_added(Technology::Go).is_err());
        assert_eq!(profile.technologies(), &stack(&[Technology::Go]));
    }

    #[test]
    fn adding_beyond_limit_fails() {
        let ten: BTreeSet<_> = Technology::ALL.into_iter().take(10).collect();
        let profile = TechProfile::new(DESCRIPTION, ten).unwrap();

        let result = profile.with_added(Technology::Kubernetes);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(profile.technologies().len(), 10);
    }

    #[test]
    fn removing_last_technology_fails() {
        let profile = TechProfile::new(DESCRIPTION, stack(&[Technology::Python])).unwrap();

        assert!(profile.with_removed(Technology::Python).is_err());
    }

    #[test]
    fn removing_absent_technology_is_not_found() {
        let profile =
            TechProfile::new(DESCRIPTION, stack(&[Technology::Python, Technology::Rust])).unwrap();

        let result = profile.with_removed(Technology::Java);

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn transformations_return_new_values() {
        let original = TechProfile::new(DESCRIPTION, stack(&[Technology::Python])).unwrap();

        let replaced = original
            .with_technologies(stack(&[Technology::Vue, Technology::Typescript]))
            .unwrap();
        let redescribed = replaced
            .with_description("Frontend for the study groups")
            .unwrap();

        assert_eq!(original.technologies(), &stack(&[Technology::Python]));
        assert_eq!(replaced.description(), DESCRIPTION);
        assert_eq!(
            redescribed.technologies(),
            &stack(&[Technology::Vue, Technology::Typescript])
        );
    }

    #[test]
    fn technology_text_round_trip() {
        for tech in Technology::ALL {
            assert_eq!(tech.as_str().parse::<Technology>().unwrap(), tech);
        }
    }
}
