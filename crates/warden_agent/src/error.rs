//! Error types for the agent core
//!
//! Only construction-time failures are errors. Per-tick conditions such as
//! an unreachable goal, a missing nearest-node mapping or an absent target
//! are expressed in types (empty paths, `Option`) and retried next tick.

use thiserror::Error;

/// Agent core errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// The navigation graph collaborator is missing or empty
    #[error("navigation graph has no nodes; agent cannot plan routes")]
    EmptyNavGraph,

    /// Invalid tuning parameters
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
