use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// Drives which [`Strategy`](yieldkeeper_strategy) implementation is active
/// and the thresholds it screens opportunities through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub min_apy_improvement: Decimal,
    pub min_rebalance_amount: Decimal,
    pub risk_tolerance: RiskTolerance,
    #[serde(default)]
    pub allow_high_risk: bool,
    /// Fraction (0.0-1.0) of total capital permitted in a single protocol.
    pub max_concentration_pct: Decimal,
    /// Target number of distinct protocols to hold positions in.
    pub diversification_target: u32,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_apy_improvement < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "strategy.min_apy_improvement must not be negative".into(),
            ));
        }

        if self.min_rebalance_amount <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "strategy.min_rebalance_amount must be positive".into(),
            ));
        }

        if self.max_concentration_pct <= Decimal::ZERO || self.max_concentration_pct > Decimal::ONE
        {
            return Err(ConfigError::Invalid(
                "strategy.max_concentration_pct must be in (0, 1]".into(),
            ));
        }

        if self.diversification_target == 0 {
            return Err(ConfigError::Invalid(
                "strategy.diversification_target must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
