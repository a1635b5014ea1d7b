// Project domain module
// Contains the project aggregate root and its role/status vocabulary

#![allow(clippy::module_inception)]

pub mod project;
pub mod value_objects;

pub use project::{
    Project, ProjectChanges, ProjectParticipant, MAX_ASSIGNED_ROLES, MAX_PARTICIPANTS,
    MAX_SET_ROLES,
};
pub use value_objects::{ProjectRole, ProjectStatus};
