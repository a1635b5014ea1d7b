//! DevCollab API Library
//!
//! Teams, projects and people for a developer collaboration platform:
//! domain aggregates, application services, storage adapters and the
//! HTTP layer.

pub mod api;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
