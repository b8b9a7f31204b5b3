//! Execution-time wiring this binary needs beyond `yieldkeeper_config::Config`
//! — an on-chain owner address, per-token decimals, and the flat
//! price/gas figures the in-process `ChainGateway`/`GasSource`/`PriceSource`
//! stand-ins return. None of this is a recognized option in the core design
//! (§6): it exists only because *something* has to supply real collaborators
//! for a core that only ever consumes trait objects. Mirrors the
//! `ExecutionRequest` vs `RebalanceRecommendation` split in
//! `yieldkeeper-executor` — wiring detail kept out of the core's own types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use config_crate::{Config as RawConfig, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("failed to load wiring config: {0}")]
    Load(String),
    #[error("invalid wiring config: {0}")]
    Invalid(String),
}

fn default_token_decimals() -> u32 {
    18
}

fn default_gas_price_gwei() -> Decimal {
    Decimal::from(20)
}

fn default_eth_usd_price() -> Decimal {
    Decimal::from(3000)
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./yieldkeeper-audit.jsonl")
}

/// Internal stand-ins' static world view. A real deployment replaces every
/// field here with a live feed; this binary's `ChainGateway`/`GasSource`/
/// `PriceSource` implementations are dry-run by construction (§4.3's
/// dry-run rule applied one layer up, since no live chain client is in
/// scope here either).
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub owner_address: String,

    #[serde(default)]
    pub token_decimals: HashMap<String, u32>,
    #[serde(default = "default_token_decimals")]
    pub default_token_decimals: u32,

    #[serde(default)]
    pub static_prices_usd: HashMap<String, Decimal>,
    #[serde(default)]
    pub default_price_usd: Option<Decimal>,

    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: Decimal,
    #[serde(default = "default_eth_usd_price")]
    pub eth_usd_price: Decimal,

    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    /// Process exits gracefully once the next scheduled cycle would start
    /// at or after this timestamp. `None` means run indefinitely.
    #[serde(default)]
    pub run_deadline: Option<DateTime<Utc>>,
}

impl EngineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, WiringError> {
        let mut builder = RawConfig::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ENGINE")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder.build().map_err(|e| WiringError::Load(e.to_string()))?;
        let config: EngineConfig = raw
            .try_deserialize()
            .map_err(|e| WiringError::Load(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WiringError> {
        if self.owner_address.trim().is_empty() {
            return Err(WiringError::Invalid("owner_address must not be empty".into()));
        }
        if self.gas_price_gwei <= Decimal::ZERO {
            return Err(WiringError::Invalid("gas_price_gwei must be positive".into()));
        }
        if self.eth_usd_price <= Decimal::ZERO {
            return Err(WiringError::Invalid("eth_usd_price must be positive".into()));
        }
        Ok(())
    }

    pub fn decimals_for(&self, token: &str) -> u32 {
        self.token_decimals
            .get(token)
            .copied()
            .unwrap_or(self.default_token_decimals)
    }

    pub fn price_for(&self, token: &str) -> Option<Decimal> {
        self.static_prices_usd
            .get(token)
            .copied()
            .or(self.default_price_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_owner_address() {
        let cfg = EngineConfig {
            owner_address: "  ".to_string(),
            token_decimals: HashMap::new(),
            default_token_decimals: 18,
            static_prices_usd: HashMap::new(),
            default_price_usd: None,
            gas_price_gwei: Decimal::from(20),
            eth_usd_price: Decimal::from(3000),
            audit_log_path: default_audit_log_path(),
            run_deadline: None,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn falls_back_to_default_decimals() {
        let mut cfg = EngineConfig {
            owner_address: "0xwallet".to_string(),
            token_decimals: HashMap::new(),
            default_token_decimals: 6,
            static_prices_usd: HashMap::new(),
            default_price_usd: None,
            gas_price_gwei: Decimal::from(20),
            eth_usd_price: Decimal::from(3000),
            audit_log_path: default_audit_log_path(),
            run_deadline: None,
        };
        assert_eq!(cfg.decimals_for("USDC"), 6);
        cfg.token_decimals.insert("WETH".to_string(), 18);
        assert_eq!(cfg.decimals_for("WETH"), 18);
    }
}
