//! Layered configuration: defaults -> TOML file -> `YIELDKEEPER_`-prefixed
//! environment variables, using the `config` crate (aliased here as
//! `config-crate` to avoid colliding with this crate's own name). Validated
//! once at [`Config::load`] — invalid configuration is fatal at startup,
//! never discovered lazily at first use.

mod error;
mod profitability;
mod risk;
mod rpc;
mod scheduler;
mod spending;
mod strategy;

pub use error::ConfigError;
pub use profitability::ProfitabilityConfig;
pub use risk::RiskConfig;
pub use rpc::{RpcConfig, RpcProviderConfig};
pub use scheduler::SchedulerConfig;
pub use spending::SpendingLimitsConfig;
pub use strategy::{RiskTolerance, StrategyConfig};

use config_crate::{Config as RawConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Known network identifiers. Kept as an explicit enum so an unrecognized
/// value fails config validation instead of silently routing traffic
/// nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    BaseMainnet,
    BaseSepolia,
    EthereumMainnet,
    PolygonMainnet,
}

/// Top-level configuration, covering every recognized operator-facing
/// option this workspace exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: Network,
    #[serde(default)]
    pub dry_run_mode: bool,
    #[serde(default)]
    pub read_only: bool,

    pub scheduler: SchedulerConfig,
    pub strategy: StrategyConfig,
    pub profitability: ProfitabilityConfig,
    pub risk: RiskConfig,
    pub spending_limits: SpendingLimitsConfig,
    pub rpc: RpcConfig,

    /// Restricts the adapter set Strategy may route to.
    pub supported_protocols: Vec<String>,
}

impl Config {
    /// Load from an optional TOML file, then apply `YIELDKEEPER_`-prefixed
    /// environment variable overrides (double-underscore separated for
    /// nested fields, e.g. `YIELDKEEPER_SPENDING_LIMITS__DAILY_LIMIT_USD`),
    /// then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = RawConfig::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("YIELDKEEPER")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let config: Config = raw
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Every positivity/hierarchy/enum constraint this configuration must
    /// satisfy. Returns the *first* violation found — callers that want an
    /// exhaustive report should call the per-section `validate` methods
    /// directly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spending_limits.validate()?;
        self.strategy.validate()?;
        self.profitability.validate()?;
        self.risk.validate()?;
        self.scheduler.validate()?;
        self.rpc.validate()?;

        if self.supported_protocols.is_empty() {
            return Err(ConfigError::Invalid(
                "supported_protocols must list at least one protocol".into(),
            ));
        }

        Ok(())
    }
}
