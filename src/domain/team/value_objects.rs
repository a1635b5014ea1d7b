use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::roster::RosterRole;

/// Role a member holds inside a team
///
/// Exactly one member of every team holds `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Team creator, sole holder, cannot be removed
    Owner,
    /// May manage membership and team attributes
    Maintainer,
    BackendDeveloper,
    FrontendDeveloper,
    Manager,
    Designer,
}

impl TeamRole {
    pub const ALL: [TeamRole; 6] = [
        TeamRole::Owner,
        TeamRole::Maintainer,
        TeamRole::BackendDeveloper,
        TeamRole::FrontendDeveloper,
        TeamRole::Manager,
        TeamRole::Designer,
    ];

    /// Stable text form used in storage and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Maintainer => "maintainer",
            TeamRole::BackendDeveloper => "backend_developer",
            TeamRole::FrontendDeveloper => "frontend_developer",
            TeamRole::Manager => "manager",
            TeamRole::Designer => "designer",
        }
    }
}

impl RosterRole for TeamRole {
    const PRIVILEGED: Self = TeamRole::Owner;
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown team role: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_privileged() {
        assert_eq!(TeamRole::PRIVILEGED, TeamRole::Owner);
    }

    #[test]
    fn text_form_parses_back() {
        for role in TeamRole::ALL {
            assert_eq!(role.as_str().parse::<TeamRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert!("captain".parse::<TeamRole>().is_err());
    }

    #[test]
    fn role_display() {
        assert_eq!(TeamRole::Owner.to_string(), "owner");
        assert_eq!(TeamRole::BackendDeveloper.to_string(), "backend_developer");
    }

    #[test]
    fn serde_matches_text_form() {
        let json = serde_json::to_string(&TeamRole::FrontendDeveloper).unwrap();
        assert_eq!(json, "\"frontend_developer\"");
    }
}
