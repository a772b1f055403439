//! Execution services layer

pub mod coordinator;

pub use coordinator::{ExecutionCoordinator, DEFAULT_COMMANDS};
