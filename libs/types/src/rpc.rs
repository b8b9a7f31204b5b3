use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tier of an RPC endpoint. Candidate ordering in the dispatcher is always
/// `Premium -> Backup -> Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointPriority {
    Premium,
    Backup,
    Public,
}

impl EndpointPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointPriority::Premium => "premium",
            EndpointPriority::Backup => "backup",
            EndpointPriority::Public => "public",
        }
    }
}

/// Circuit breaker state. `Closed` is the only valid initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Static configuration plus mutable health/rate-limit state for one RPC
/// endpoint. `Instant`s aren't serializable, so this type lives only in
/// process memory — never persisted directly.
#[derive(Debug, Clone)]
pub struct RpcEndpoint {
    pub url: String,
    pub priority: EndpointPriority,
    pub provider: String,
    pub network: String,
    pub rate_limit_per_second: u32,
    pub rate_limit_per_minute: u32,

    pub is_healthy: bool,
    pub consecutive_failures: u32,
    pub ema_latency_ms: f64,
    pub req_this_second: u32,
    pub req_this_minute: u32,
    pub last_request_time: Option<Instant>,
}

impl RpcEndpoint {
    pub fn new(
        url: impl Into<String>,
        priority: EndpointPriority,
        provider: impl Into<String>,
        network: impl Into<String>,
        rate_limit_per_second: u32,
        rate_limit_per_minute: u32,
    ) -> Self {
        Self {
            url: url.into(),
            priority,
            provider: provider.into(),
            network: network.into(),
            rate_limit_per_second,
            rate_limit_per_minute,
            is_healthy: true,
            consecutive_failures: 0,
            ema_latency_ms: 0.0,
            req_this_second: 0,
            req_this_minute: 0,
            last_request_time: None,
        }
    }

    /// An endpoint is healthy iff it has fewer than 3 consecutive failures.
    pub const UNHEALTHY_THRESHOLD: u32 = 3;

    pub fn recompute_health(&mut self) {
        self.is_healthy = self.consecutive_failures < Self::UNHEALTHY_THRESHOLD;
    }

    /// Exponential moving average, alpha = 0.3.
    pub fn record_latency(&mut self, latency_ms: f64) {
        const ALPHA: f64 = 0.3;
        self.ema_latency_ms = if self.ema_latency_ms == 0.0 {
            latency_ms
        } else {
            ALPHA * latency_ms + (1.0 - ALPHA) * self.ema_latency_ms
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_threshold() {
        let mut ep = RpcEndpoint::new("u", EndpointPriority::Premium, "p", "n", 10, 100);
        ep.consecutive_failures = 2;
        ep.recompute_health();
        assert!(ep.is_healthy);
        ep.consecutive_failures = 3;
        ep.recompute_health();
        assert!(!ep.is_healthy);
    }

    #[test]
    fn ema_latency_seeds_from_first_sample() {
        let mut ep = RpcEndpoint::new("u", EndpointPriority::Premium, "p", "n", 10, 100);
        ep.record_latency(100.0);
        assert_eq!(ep.ema_latency_ms, 100.0);
        ep.record_latency(200.0);
        assert!((ep.ema_latency_ms - 130.0).abs() < 1e-9);
    }
}
