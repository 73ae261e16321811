//! Orchestrator error types.

use thiserror::Error;

/// Result type alias for orchestrator calls.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator unreachable at {address}: {reason}")]
    Transport { address: String, reason: String },

    #[error("orchestrator rejected {action} with status {status}: {body}")]
    Rejected {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to build request: {0}")]
    Request(String),
}
