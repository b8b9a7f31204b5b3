use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Thresholds behind the four profitability gates (§3): APY improvement,
/// net gain, break-even window, and cost percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitabilityConfig {
    pub min_annual_gain_usd: Decimal,
    pub max_break_even_days: u64,
    /// Fraction of position size total costs may not exceed.
    pub max_cost_pct: Decimal,
    pub default_slippage_bps: u32,
}

impl ProfitabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_annual_gain_usd < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "profitability.min_annual_gain_usd must not be negative".into(),
            ));
        }

        if self.max_break_even_days == 0 {
            return Err(ConfigError::Invalid(
                "profitability.max_break_even_days must be greater than 0".into(),
            ));
        }

        if self.max_cost_pct <= Decimal::ZERO || self.max_cost_pct > Decimal::ONE {
            return Err(ConfigError::Invalid(
                "profitability.max_cost_pct must be in (0, 1]".into(),
            ));
        }

        if self.default_slippage_bps > 10_000 {
            return Err(ConfigError::Invalid(
                "profitability.default_slippage_bps must be <= 10000".into(),
            ));
        }

        Ok(())
    }
}
