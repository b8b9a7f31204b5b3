use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Thresholds and the protocol safety table the Risk Assessor's seven-factor
/// score is built from. Safety scores live here rather than as code
/// constants so a new protocol integration is a config change, not a
/// release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub large_position_threshold_usd: Decimal,
    pub small_position_threshold_usd: Decimal,
    /// Protocol name -> safety risk points (0 = safest, higher = riskier),
    /// one of the seven additive factors in the risk score. A protocol
    /// absent from this table scores the factor's max (§4.6, "unknown ->
    /// max") rather than falling back to some other configured number.
    #[serde(default)]
    pub protocol_safety_scores: HashMap<String, u8>,
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.large_position_threshold_usd <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "risk.large_position_threshold_usd must be positive".into(),
            ));
        }

        if self.small_position_threshold_usd <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "risk.small_position_threshold_usd must be positive".into(),
            ));
        }

        if self.small_position_threshold_usd >= self.large_position_threshold_usd {
            return Err(ConfigError::Invalid(
                "risk.small_position_threshold_usd must be < large_position_threshold_usd".into(),
            ));
        }

        for (protocol, score) in &self.protocol_safety_scores {
            if *score > 100 {
                return Err(ConfigError::Invalid(format!(
                    "risk.protocol_safety_scores[{protocol}] must be <= 100, got {score}"
                )));
            }
        }

        Ok(())
    }

    /// Safety points for `protocol`, or `None` when it has no entry in the
    /// table (the caller scores that case as max risk, per §4.6).
    pub fn safety_score_for(&self, protocol: &str) -> Option<u8> {
        self.protocol_safety_scores.get(protocol).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid() -> RiskConfig {
        let mut scores = HashMap::new();
        scores.insert("aave-v3".to_string(), 5);
        RiskConfig {
            large_position_threshold_usd: dec!(1000000),
            small_position_threshold_usd: dec!(1000),
            protocol_safety_scores: scores,
        }
    }

    #[test]
    fn accepts_default_shape() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn unlisted_protocol_has_no_safety_score() {
        let cfg = valid();
        assert_eq!(cfg.safety_score_for("aave-v3"), Some(5));
        assert_eq!(cfg.safety_score_for("unheard-of-protocol"), None);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut cfg = valid();
        cfg.small_position_threshold_usd = dec!(2000000);
        assert!(cfg.validate().is_err());
    }
}
