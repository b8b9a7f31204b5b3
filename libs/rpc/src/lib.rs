//! Failover, rate limiting, circuit breaking, redaction, and usage tracking
//! for outbound chain RPC traffic.

mod circuit_breaker;
mod dispatcher;
mod error;
mod redaction;
mod rollout;
mod usage;

pub use circuit_breaker::CircuitBreaker;
pub use dispatcher::{EndpointHandle, RpcDispatcher};
pub use error::RpcError;
pub use redaction::sanitize_url;
pub use rollout::{fraction_to_premium, should_use_premium};
pub use usage::{DailyUsageSummary, ProviderUsage, RpcUsageTracker};
