use thiserror::Error;

/// Errors surfaced across every external-collaborator trait boundary. Kept
/// deliberately small and string-carrying since the concrete causes (RPC
/// transport errors, HTTP failures, disk errors) live in the implementing
/// crate, not here.
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("chain gateway error: {0}")]
    Chain(String),

    #[error("price source error for {symbol}: {reason}")]
    Price { symbol: String, reason: String },

    #[error("gas source error: {0}")]
    Gas(String),

    #[error("protocol adapter error ({protocol}): {reason}")]
    Adapter { protocol: String, reason: String },

    #[error("position store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, InterfaceError>;
