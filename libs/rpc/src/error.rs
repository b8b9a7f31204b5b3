use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("no healthy endpoints available for network {0}")]
    AllEndpointsFailed(String),

    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("endpoint operation failed: {0}")]
    Operation(String),
}
