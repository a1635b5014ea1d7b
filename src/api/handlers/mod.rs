pub mod auth;
pub mod desired_projects;
pub mod projects;
pub mod teams;
pub mod users;
