#![allow(clippy::module_inception)]

pub mod desired_project;

pub use desired_project::DesiredProject;
