//! Command handlers for the Wayfinder CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod queue;
pub mod resolve;
pub mod submit;
pub mod worker;

// Re-export command types for convenience
pub use queue::QueueCommand;
pub use resolve::ResolveCommand;
pub use submit::SubmitCommand;
pub use worker::WorkerCommand;
