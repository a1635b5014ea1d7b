// Infrastructure layer module
// Adapters behind the repository and unit-of-work ports

pub mod memory;
pub mod postgres;
pub mod reconcile;
