//! Engine client error types.

use thiserror::Error;

/// Result type alias for engine RPCs.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures talking to the remote engine. All of them are transient from
/// the bridge's point of view: the next probe or iteration retries.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("engine rpc {method} failed: {status}")]
    Rpc {
        method: &'static str,
        status: tonic::Status,
    },
}

impl EngineError {
    pub fn rpc(method: &'static str, status: tonic::Status) -> Self {
        EngineError::Rpc { method, status }
    }
}
