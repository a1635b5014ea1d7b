// Team domain module
// Contains the team aggregate root and its role vocabulary

#![allow(clippy::module_inception)]

pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use team::{Team, TeamMember, MAX_TEAM_MEMBERS};
pub use value_objects::TeamRole;
