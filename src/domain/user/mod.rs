#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{ProfileChanges, User};
pub use value_objects::{Email, PlatformRole, UserStatus};
