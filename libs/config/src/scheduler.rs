use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Cadence and safety-valve knobs for the control loop in
/// `services/optimizer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub scan_interval_hours: u64,
    pub max_rebalances_per_day: u32,
    pub max_gas_per_day_usd: Decimal,
    /// Cycle is considered hung and logged as a watchdog timeout past this.
    pub watchdog_timeout_secs: u64,
    /// A cycle still running past this long emits a warning but is not
    /// yet treated as hung.
    pub watchdog_warn_secs: u64,
    /// Tolerance (USD) below which a position-value drift is not worth a
    /// `position_reconciled` audit event.
    #[serde(default = "default_reconciliation_tolerance_usd")]
    pub reconciliation_tolerance_usd: Decimal,
}

fn default_reconciliation_tolerance_usd() -> Decimal {
    Decimal::ONE
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval_hours == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.scan_interval_hours must be greater than 0".into(),
            ));
        }

        if self.max_rebalances_per_day == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_rebalances_per_day must be greater than 0".into(),
            ));
        }

        if self.max_gas_per_day_usd <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "scheduler.max_gas_per_day_usd must be positive".into(),
            ));
        }

        if self.watchdog_warn_secs >= self.watchdog_timeout_secs {
            return Err(ConfigError::Invalid(
                "scheduler.watchdog_warn_secs must be < watchdog_timeout_secs".into(),
            ));
        }

        if self.reconciliation_tolerance_usd < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "scheduler.reconciliation_tolerance_usd must not be negative".into(),
            ));
        }

        Ok(())
    }
}
