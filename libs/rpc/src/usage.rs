//! Per-day and per-month request counters keyed by `provider_priority`,
//! producing the `rpc_usage_summary` audit payload (§4.1, §4.10).

use std::collections::HashMap;

use dashmap::DashMap;
use yieldkeeper_types::EndpointPriority;

fn key(provider: &str, priority: EndpointPriority) -> String {
    format!("{provider}_{}", priority.as_str())
}

#[derive(Debug, Clone, Default)]
struct Counters {
    daily: u64,
    monthly: u64,
    daily_failures: u64,
}

/// One provider's usage figures, rolled up for the daily summary.
#[derive(Debug, Clone)]
pub struct ProviderUsage {
    pub provider_priority: String,
    pub daily_requests: u64,
    pub daily_failures: u64,
    /// `None` when the provider has no configured free-tier quota.
    pub percent_of_free_tier: Option<f64>,
}

/// Aggregated daily report, shaped for direct inclusion as audit event
/// metadata.
#[derive(Debug, Clone)]
pub struct DailyUsageSummary {
    pub premium_requests: u64,
    pub backup_requests: u64,
    pub public_requests: u64,
    pub total_requests: u64,
    pub total_failures: u64,
    pub per_provider: Vec<ProviderUsage>,
    pub approaching_limit: bool,
}

/// Threshold past which a provider is flagged as approaching its free-tier
/// quota.
const APPROACHING_LIMIT_PCT: f64 = 80.0;

pub struct RpcUsageTracker {
    counters: DashMap<String, Counters>,
    /// Daily portion of each provider's free-tier quota (monthly / 30),
    /// keyed the same way as `counters`.
    daily_quotas: HashMap<String, f64>,
}

impl RpcUsageTracker {
    pub fn new(free_tier_quotas: HashMap<String, u64>) -> Self {
        let daily_quotas = free_tier_quotas
            .into_iter()
            .map(|(k, monthly)| (k, monthly as f64 / 30.0))
            .collect();

        Self {
            counters: DashMap::new(),
            daily_quotas,
        }
    }

    pub fn record_request(&self, provider: &str, priority: EndpointPriority, success: bool) {
        let k = key(provider, priority);
        let mut entry = self.counters.entry(k).or_default();
        entry.daily += 1;
        entry.monthly += 1;
        if !success {
            entry.daily_failures += 1;
        }
    }

    pub fn reset_daily_usage(&self) {
        for mut entry in self.counters.iter_mut() {
            entry.daily = 0;
            entry.daily_failures = 0;
        }
    }

    pub fn daily_summary(&self) -> DailyUsageSummary {
        let mut premium_requests = 0;
        let mut backup_requests = 0;
        let mut public_requests = 0;
        let mut total_failures = 0;
        let mut per_provider = Vec::new();
        let mut approaching_limit = false;

        for entry in self.counters.iter() {
            let k = entry.key();
            let counters = entry.value();

            if k.ends_with("_premium") {
                premium_requests += counters.daily;
            } else if k.ends_with("_backup") {
                backup_requests += counters.daily;
            } else if k.ends_with("_public") {
                public_requests += counters.daily;
            }
            total_failures += counters.daily_failures;

            let percent_of_free_tier = self.daily_quotas.get(k).and_then(|quota| {
                if *quota > 0.0 {
                    Some((counters.daily as f64 / quota) * 100.0)
                } else {
                    None
                }
            });

            if let Some(pct) = percent_of_free_tier {
                if pct > APPROACHING_LIMIT_PCT {
                    approaching_limit = true;
                }
            }

            per_provider.push(ProviderUsage {
                provider_priority: k.clone(),
                daily_requests: counters.daily,
                daily_failures: counters.daily_failures,
                percent_of_free_tier,
            });
        }

        DailyUsageSummary {
            total_requests: premium_requests + backup_requests + public_requests,
            premium_requests,
            backup_requests,
            public_requests,
            total_failures,
            per_provider,
            approaching_limit,
        }
    }
}
