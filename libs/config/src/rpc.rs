use serde::{Deserialize, Serialize};

use crate::ConfigError;
use yieldkeeper_types::EndpointPriority;

/// One configured RPC endpoint. `url` may contain an embedded API key —
/// callers must route it through the redaction helpers in
/// `yieldkeeper-rpc` before logging it anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcProviderConfig {
    pub name: String,
    pub url: String,
    pub priority: EndpointPriority,
    pub rate_limit_per_second: u32,
    pub rate_limit_per_minute: u32,
    /// Monthly request quota on the provider's free tier, if any. Used by
    /// the usage tracker to report percent-of-free-tier consumed.
    #[serde(default)]
    pub free_tier_quota: Option<u64>,
}

/// RPC Dispatcher tuning: endpoint list, gradual-rollout percentage toward
/// premium endpoints, and circuit breaker thresholds (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default)]
    pub premium_enabled: bool,
    /// Percentage (0-100) of eligible requests routed to premium endpoints
    /// once `premium_enabled` — the rest stay on public/backup tiers as a
    /// canary rollout.
    #[serde(default = "default_premium_percentage")]
    pub premium_percentage: u8,
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
    pub providers: Vec<RpcProviderConfig>,
}

fn default_premium_percentage() -> u8 {
    100
}

impl RpcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.premium_percentage > 100 {
            return Err(ConfigError::Invalid(
                "rpc.premium_percentage must be in 0..=100".into(),
            ));
        }

        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "rpc.failure_threshold must be greater than 0".into(),
            ));
        }

        if self.recovery_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "rpc.recovery_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.providers.is_empty() {
            return Err(ConfigError::Invalid(
                "rpc.providers must list at least one endpoint".into(),
            ));
        }

        for provider in &self.providers {
            if provider.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rpc.providers[{}].url must not be empty",
                    provider.name
                )));
            }
            if provider.rate_limit_per_second == 0 || provider.rate_limit_per_minute == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rpc.providers[{}] rate limits must be positive",
                    provider.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RpcConfig {
        RpcConfig {
            premium_enabled: true,
            premium_percentage: 80,
            failure_threshold: 3,
            recovery_timeout_secs: 60,
            providers: vec![RpcProviderConfig {
                name: "alchemy".into(),
                url: "https://base-mainnet.g.alchemy.com/v2/demo-key".into(),
                priority: EndpointPriority::Premium,
                rate_limit_per_second: 25,
                rate_limit_per_minute: 1000,
                free_tier_quota: Some(300_000_000),
            }],
        }
    }

    #[test]
    fn accepts_default_shape() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_empty_provider_list() {
        let mut cfg = valid();
        cfg.providers.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_premium_percentage_over_100() {
        let mut cfg = valid();
        cfg.premium_percentage = 150;
        assert!(cfg.validate().is_err());
    }
}
