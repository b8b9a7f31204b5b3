//! RPC Dispatcher: endpoint selection, failover, rate limiting, and circuit
//! breaking for one logical chain-call surface (§4.1).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use yieldkeeper_types::{EndpointPriority, RpcEndpoint};

use crate::circuit_breaker::CircuitBreaker;
use crate::error::RpcError;
use crate::redaction::sanitize_url;
use crate::rollout::should_use_premium;
use crate::usage::{DailyUsageSummary, RpcUsageTracker};

/// A candidate endpoint handle passed into the caller's operation closure.
/// Exposes only the sanitized URL and metadata an op needs to build a
/// client — never the raw URL directly, to make "log the handle" safe by
/// construction.
pub struct EndpointHandle {
    pub url: String,
    pub provider: String,
    pub priority: EndpointPriority,
}

impl EndpointHandle {
    pub fn sanitized_url(&self) -> String {
        sanitize_url(&self.url)
    }
}

struct Registered {
    state: Arc<RwLock<RpcEndpoint>>,
    breaker: CircuitBreaker,
}

pub struct RpcDispatcher {
    endpoints: RwLock<HashMap<String, Vec<Registered>>>,
    usage: RpcUsageTracker,
    premium_enabled: bool,
    premium_percentage: u8,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl RpcDispatcher {
    pub fn new(
        premium_enabled: bool,
        premium_percentage: u8,
        failure_threshold: u32,
        recovery_timeout: Duration,
        free_tier_quotas: HashMap<String, u64>,
    ) -> Self {
        info!(
            premium_enabled,
            premium_percentage, "rpc dispatcher initialized"
        );
        Self {
            endpoints: RwLock::new(HashMap::new()),
            usage: RpcUsageTracker::new(free_tier_quotas),
            premium_enabled,
            premium_percentage,
            failure_threshold,
            recovery_timeout,
        }
    }

    pub fn add_endpoint(&self, network: impl Into<String>, endpoint: RpcEndpoint) {
        let network = network.into();
        info!(
            provider = %endpoint.provider,
            priority = endpoint.priority.as_str(),
            url = %sanitize_url(&endpoint.url),
            "registered rpc endpoint"
        );
        let registered = Registered {
            breaker: CircuitBreaker::new(self.failure_threshold, self.recovery_timeout),
            state: Arc::new(RwLock::new(endpoint)),
        };
        self.endpoints
            .write()
            .entry(network)
            .or_default()
            .push(registered);
    }

    /// Healthy, circuit-closed endpoints for `network`, ordered
    /// PREMIUM -> BACKUP -> PUBLIC.
    fn healthy_candidates(&self, network: &str) -> Vec<usize> {
        let endpoints = self.endpoints.read();
        let Some(list) = endpoints.get(network) else {
            return Vec::new();
        };

        let mut indices: Vec<usize> = (0..list.len())
            .filter(|&i| {
                let ep = list[i].state.read();
                ep.is_healthy && !list[i].breaker.is_open()
            })
            .collect();

        indices.sort_by_key(|&i| list[i].state.read().priority);
        indices
    }

    /// Execute `op` against the best available endpoint for `network`,
    /// failing over through candidates in priority order.
    pub async fn execute<F, Fut, T>(&self, network: &str, op_name: &str, op: F) -> Result<T, RpcError>
    where
        F: Fn(EndpointHandle) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let mut candidates = self.healthy_candidates(network);
        if candidates.is_empty() {
            return Err(RpcError::AllEndpointsFailed(network.to_string()));
        }

        if !should_use_premium(self.premium_enabled, self.premium_percentage) {
            let endpoints = self.endpoints.read();
            let list = &endpoints[network];
            candidates.retain(|&i| list[i].state.read().priority != EndpointPriority::Premium);
        }

        if candidates.is_empty() {
            return Err(RpcError::AllEndpointsFailed(network.to_string()));
        }

        let mut last_error: Option<RpcError> = None;

        for idx in candidates {
            let (handle, provider, priority) = {
                let endpoints = self.endpoints.read();
                let registered = &endpoints[network][idx];
                let mut ep = registered.state.write();

                if !can_make_request(&ep) {
                    debug!(provider = %ep.provider, "skipping endpoint: rate limited");
                    continue;
                }
                if registered.breaker.is_open() {
                    debug!(provider = %ep.provider, "skipping endpoint: circuit open");
                    continue;
                }

                record_request(&mut ep);
                (
                    EndpointHandle {
                        url: ep.url.clone(),
                        provider: ep.provider.clone(),
                        priority: ep.priority,
                    },
                    ep.provider.clone(),
                    ep.priority,
                )
            };

            let breaker = {
                let endpoints = self.endpoints.read();
                endpoints[network][idx].breaker.clone()
            };

            let start = Instant::now();
            let result = op(handle).await;
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(value) => {
                    breaker.record_success();
                    {
                        let endpoints = self.endpoints.read();
                        let mut ep = endpoints[network][idx].state.write();
                        ep.consecutive_failures = 0;
                        ep.record_latency(latency_ms);
                        ep.recompute_health();
                    }
                    self.usage.record_request(&provider, priority, true);
                    debug!(op_name, provider = %provider, latency_ms, "rpc call succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    breaker.record_failure();
                    {
                        let endpoints = self.endpoints.read();
                        let mut ep = endpoints[network][idx].state.write();
                        ep.consecutive_failures += 1;
                        ep.recompute_health();
                    }
                    self.usage.record_request(&provider, priority, false);
                    warn!(op_name, provider = %provider, error = %err, "rpc call failed, trying next endpoint");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RpcError::AllEndpointsFailed(network.to_string())))
    }

    pub fn usage_summary(&self) -> DailyUsageSummary {
        self.usage.daily_summary()
    }

    pub fn reset_daily_usage(&self) {
        self.usage.reset_daily_usage();
    }
}

fn can_make_request(ep: &RpcEndpoint) -> bool {
    let (within_second, within_minute) = rate_limit_windows(ep);
    within_second && within_minute
}

/// Returns (within-per-second-limit, within-per-minute-limit) as of *now*,
/// without mutating counters — used for the skip check before
/// `record_request` actually advances them.
fn rate_limit_windows(ep: &RpcEndpoint) -> (bool, bool) {
    let elapsed = ep
        .last_request_time
        .map(|t| t.elapsed())
        .unwrap_or(Duration::from_secs(u64::MAX));

    let req_this_second = if elapsed >= Duration::from_secs(1) {
        0
    } else {
        ep.req_this_second
    };
    let req_this_minute = if elapsed >= Duration::from_secs(60) {
        0
    } else {
        ep.req_this_minute
    };

    (
        req_this_second < ep.rate_limit_per_second,
        req_this_minute < ep.rate_limit_per_minute,
    )
}

/// Advance the token-bucket counters, resetting on boundary crossings.
fn record_request(ep: &mut RpcEndpoint) {
    let elapsed = ep
        .last_request_time
        .map(|t| t.elapsed())
        .unwrap_or(Duration::from_secs(u64::MAX));

    if elapsed >= Duration::from_secs(1) {
        ep.req_this_second = 0;
    }
    if elapsed >= Duration::from_secs(60) {
        ep.req_this_minute = 0;
    }

    ep.req_this_second += 1;
    ep.req_this_minute += 1;
    ep.last_request_time = Some(Instant::now());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> RpcDispatcher {
        RpcDispatcher::new(true, 100, 3, Duration::from_secs(60), HashMap::new())
    }

    #[tokio::test]
    async fn executes_against_the_only_endpoint() {
        let dispatcher = dispatcher();
        dispatcher.add_endpoint(
            "base-mainnet",
            RpcEndpoint::new(
                "https://example.com/v2/secretkey",
                EndpointPriority::Premium,
                "alchemy",
                "base-mainnet",
                100,
                6000,
            ),
        );

        let result: Result<u64, RpcError> = dispatcher
            .execute("base-mainnet", "block_number", |_handle| async { Ok(42u64) })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn fails_over_to_next_endpoint_on_error() {
        let dispatcher = dispatcher();
        dispatcher.add_endpoint(
            "base-mainnet",
            RpcEndpoint::new(
                "https://primary.example.com/v2/key",
                EndpointPriority::Premium,
                "alchemy",
                "base-mainnet",
                100,
                6000,
            ),
        );
        dispatcher.add_endpoint(
            "base-mainnet",
            RpcEndpoint::new(
                "https://backup.example.com/v2/key",
                EndpointPriority::Backup,
                "quicknode",
                "base-mainnet",
                100,
                6000,
            ),
        );

        let result: Result<u64, RpcError> = dispatcher
            .execute("base-mainnet", "block_number", |handle| async move {
                if handle.provider == "alchemy" {
                    Err(RpcError::Operation("timeout".into()))
                } else {
                    Ok(7u64)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn errors_when_network_has_no_endpoints() {
        let dispatcher = dispatcher();
        let result: Result<u64, RpcError> = dispatcher
            .execute("unknown-network", "block_number", |_| async { Ok(1u64) })
            .await;
        assert!(matches!(result, Err(RpcError::AllEndpointsFailed(_))));
    }
}
