use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use yieldkeeper_interfaces::ProtocolAdapter;
use yieldkeeper_rpc::CircuitBreaker;
use yieldkeeper_types::YieldOpportunity;

use crate::analytics::YieldComparison;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("adapter {0} timed out")]
    Timeout(String),
    #[error("adapter {0} failed: {1}")]
    AdapterFailed(String, String),
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const BREAKER_THRESHOLD: u32 = 3;
const BREAKER_COOLDOWN: Duration = Duration::from_secs(300);

struct TrackedAdapter {
    adapter: Arc<dyn ProtocolAdapter>,
    breaker: CircuitBreaker,
}

/// Fans scan requests out to every registered adapter in parallel, with a
/// per-adapter timeout and circuit breaker so one hung or failing adapter
/// can never hold up the rest (§4.4, §5).
pub struct YieldScanner {
    adapters: Vec<TrackedAdapter>,
    timeout: Duration,
}

impl YieldScanner {
    pub fn new(adapters: Vec<Arc<dyn ProtocolAdapter>>) -> Self {
        Self::with_timeout(adapters, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(adapters: Vec<Arc<dyn ProtocolAdapter>>, timeout: Duration) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| TrackedAdapter {
                adapter,
                breaker: CircuitBreaker::new(BREAKER_THRESHOLD, BREAKER_COOLDOWN),
            })
            .collect();
        Self { adapters, timeout }
    }

    /// Scan every registered adapter in parallel and return opportunities
    /// stably sorted by APY descending. Adapters whose circuit is open are
    /// skipped without being spawned; adapters that time out or error
    /// contribute no results but never abort the overall scan.
    pub async fn scan_all(&self) -> Vec<YieldOpportunity> {
        let futures = self.adapters.iter().map(|tracked| async move {
            if tracked.breaker.is_open() {
                debug!(protocol = tracked.adapter.name(), "skipping: circuit open");
                return Vec::new();
            }

            let name = tracked.adapter.name().to_string();
            let result = tokio::time::timeout(self.timeout, tracked.adapter.get_pools()).await;

            match result {
                Ok(Ok(pools)) => {
                    tracked.breaker.record_success();
                    pools
                }
                Ok(Err(err)) => {
                    tracked.breaker.record_failure();
                    warn!(protocol = %name, error = %err, "adapter scan failed");
                    Vec::new()
                }
                Err(_) => {
                    tracked.breaker.record_failure();
                    warn!(protocol = %name, timeout_secs = self.timeout.as_secs(), "adapter scan timed out");
                    Vec::new()
                }
            }
        });

        let mut all: Vec<YieldOpportunity> = futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect();

        all.sort_by(|a, b| b.apy.cmp(&a.apy));
        all
    }

    pub async fn best_yield_for_token(&self, token: &str) -> Option<YieldOpportunity> {
        self.scan_all()
            .await
            .into_iter()
            .find(|opp| opp.tokens.iter().any(|t| t == token))
    }

    pub async fn filter(
        &self,
        min_apy: Option<Decimal>,
        min_tvl: Option<Decimal>,
        token: Option<&str>,
    ) -> Vec<YieldOpportunity> {
        self.scan_all()
            .await
            .into_iter()
            .filter(|opp| min_apy.map_or(true, |min| opp.apy >= min))
            .filter(|opp| min_tvl.map_or(true, |min| opp.tvl_usd >= min))
            .filter(|opp| token.map_or(true, |t| opp.tokens.iter().any(|ot| ot == t)))
            .collect()
    }

    pub async fn compare_yields(&self) -> YieldComparison {
        YieldComparison::from_opportunities(&self.scan_all().await)
    }
}
