use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Hard USD ceilings the Rebalance Executor must never exceed, checked
/// before every submitted transaction and accumulated against daily
/// counters in [`SchedulerStatus`](yieldkeeper_types::SchedulerStatus).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingLimitsConfig {
    pub max_transaction_value_usd: Decimal,
    pub daily_spending_limit_usd: Decimal,
    /// Transactions at or above this value require external sign-off
    /// before the Executor will submit them.
    pub approval_threshold_usd: Decimal,
}

impl SpendingLimitsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_transaction_value_usd", self.max_transaction_value_usd),
            ("daily_spending_limit_usd", self.daily_spending_limit_usd),
            ("approval_threshold_usd", self.approval_threshold_usd),
        ] {
            if value <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "spending_limits.{name} must be positive, got {value}"
                )));
            }
        }

        if self.approval_threshold_usd > self.max_transaction_value_usd {
            return Err(ConfigError::Invalid(
                "spending_limits.approval_threshold_usd must be <= max_transaction_value_usd"
                    .into(),
            ));
        }

        if self.max_transaction_value_usd > self.daily_spending_limit_usd {
            return Err(ConfigError::Invalid(
                "spending_limits.max_transaction_value_usd must be <= daily_spending_limit_usd"
                    .into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid() -> SpendingLimitsConfig {
        SpendingLimitsConfig {
            max_transaction_value_usd: dec!(50000),
            daily_spending_limit_usd: dec!(100000),
            approval_threshold_usd: dec!(25000),
        }
    }

    #[test]
    fn accepts_well_formed_hierarchy() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_approval_above_max_transaction() {
        let mut cfg = valid();
        cfg.approval_threshold_usd = dec!(60000);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_limit() {
        let mut cfg = valid();
        cfg.daily_spending_limit_usd = Decimal::ZERO;
        assert!(cfg.validate().is_err());
    }
}
