use std::collections::HashMap;

use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;

use yieldkeeper_config::RiskConfig;
use yieldkeeper_types::RiskAssessment;

const PROTOCOL_SAFETY_CAP: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
const TVL_CAP: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const UTILIZATION_CAP: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const POSITION_SIZE_CAP: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const SWAP_CAP: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
const CONCENTRATION_CAP: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const DIVERSIFICATION_CAP: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Whether a candidate move needs a swap, is a same-token rebalance, or is
/// brand-new capital with nothing to withdraw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapNeed {
    NewCapital,
    SameToken,
    Swap,
}

/// Everything the seven-factor score needs about one candidate move and the
/// portfolio it would land in.
#[derive(Debug, Clone)]
pub struct RiskInputs<'a> {
    pub protocol: &'a str,
    pub tvl_usd: Decimal,
    /// Pool utilization, 0..=100. `None` when the adapter can't report it.
    pub utilization_pct: Option<Decimal>,
    pub position_size_usd: Decimal,
    pub swap_need: SwapNeed,
    /// Max single-protocol share of portfolio value *after* this move
    /// completes, 0.0..=1.0.
    pub max_protocol_share_after_move: Decimal,
    /// Distinct protocols the portfolio would hold positions in after this
    /// move.
    pub protocol_count_after_move: u32,
}

/// Scores protocol, position, and portfolio-concentration risk for one
/// candidate move and applies the proceed/veto gate (§4.6).
pub struct RiskAssessor<'a> {
    config: &'a RiskConfig,
    diversification_target: u32,
}

impl<'a> RiskAssessor<'a> {
    pub fn new(config: &'a RiskConfig, diversification_target: u32) -> Self {
        Self {
            config,
            diversification_target,
        }
    }

    pub fn assess(&self, inputs: &RiskInputs) -> RiskAssessment {
        let mut factors = HashMap::new();

        let protocol_safety = self.protocol_safety_factor(inputs.protocol);
        let tvl_adequacy = Self::tvl_factor(inputs.tvl_usd);
        let utilization = Self::utilization_factor(inputs.utilization_pct);
        let position_size = self.position_size_factor(inputs.position_size_usd);
        let swap_requirement = Self::swap_factor(inputs.swap_need);
        let concentration = Self::concentration_factor(inputs.max_protocol_share_after_move);
        let diversification =
            self.diversification_factor(inputs.protocol_count_after_move);

        factors.insert("protocol_safety".to_string(), protocol_safety);
        factors.insert("tvl_adequacy".to_string(), tvl_adequacy);
        factors.insert("utilization".to_string(), utilization);
        factors.insert("position_size".to_string(), position_size);
        factors.insert("swap_requirement".to_string(), swap_requirement);
        factors.insert("concentration".to_string(), concentration);
        factors.insert("diversification".to_string(), diversification);

        let total = protocol_safety
            + tvl_adequacy
            + utilization
            + position_size
            + swap_requirement
            + concentration
            + diversification;

        let score = total
            .round()
            .to_string()
            .parse::<i64>()
            .unwrap_or(100);

        let recommendation = Self::recommendation_for(score);
        let assessment = RiskAssessment::new(score, factors, recommendation);

        if assessment.risk_score > 50 {
            tracing::warn!(
                protocol = inputs.protocol,
                score = assessment.risk_score,
                level = %assessment.risk_level,
                "elevated risk assessment"
            );
        }

        assessment
    }

    /// `CRITICAL` always vetoes; `HIGH` vetoes unless the caller has opted
    /// into `allow_high_risk`.
    pub fn should_proceed(assessment: &RiskAssessment, allow_high_risk: bool) -> bool {
        use yieldkeeper_types::RiskLevel;
        match assessment.risk_level {
            RiskLevel::Critical => false,
            RiskLevel::High => allow_high_risk,
            RiskLevel::Medium | RiskLevel::Low => true,
        }
    }

    fn protocol_safety_factor(&self, protocol: &str) -> Decimal {
        match self.config.safety_score_for(protocol) {
            Some(points) => (Decimal::from(points) / Decimal::from(100)) * PROTOCOL_SAFETY_CAP,
            None => PROTOCOL_SAFETY_CAP,
        }
    }

    fn tvl_factor(tvl_usd: Decimal) -> Decimal {
        if tvl_usd == Decimal::ZERO {
            // Unknown TVL is treated the same as critically thin TVL: the
            // assessor can't tell the difference between "no liquidity" and
            // "not reported yet", so it scores the worse case.
            return TVL_CAP;
        }
        if tvl_usd < Decimal::from(1_000_000) {
            TVL_CAP
        } else if tvl_usd < Decimal::from(10_000_000) {
            Decimal::from(20)
        } else {
            Decimal::ZERO
        }
    }

    fn utilization_factor(utilization_pct: Option<Decimal>) -> Decimal {
        let Some(util) = utilization_pct else {
            return Decimal::ZERO;
        };
        if util > Decimal::from(95) {
            UTILIZATION_CAP
        } else if util > Decimal::from(90) {
            Decimal::from(20)
        } else if util >= Decimal::from(80) {
            Decimal::from(10)
        } else {
            Decimal::ZERO
        }
    }

    fn position_size_factor(&self, position_size_usd: Decimal) -> Decimal {
        if position_size_usd < self.config.small_position_threshold_usd {
            return Decimal::ZERO;
        }
        if position_size_usd <= self.config.large_position_threshold_usd {
            return Decimal::ZERO;
        }

        let ratio = position_size_usd / self.config.large_position_threshold_usd;
        let Some(ln_ratio) = ratio.checked_ln() else {
            return POSITION_SIZE_CAP;
        };
        // log10(ratio) = ln(ratio) / ln(10); scale so a 10x overshoot of the
        // large-position threshold saturates the cap.
        let ln_ten = Decimal::from(10).checked_ln().unwrap_or(Decimal::ONE);
        let log10_ratio = ln_ratio / ln_ten;
        (log10_ratio * POSITION_SIZE_CAP).clamp(Decimal::ZERO, POSITION_SIZE_CAP)
    }

    fn swap_factor(swap_need: SwapNeed) -> Decimal {
        match swap_need {
            SwapNeed::NewCapital => Decimal::ZERO,
            SwapNeed::SameToken => Decimal::from(5),
            SwapNeed::Swap => SWAP_CAP,
        }
    }

    fn concentration_factor(max_protocol_share_after_move: Decimal) -> Decimal {
        (max_protocol_share_after_move * CONCENTRATION_CAP)
            .clamp(Decimal::ZERO, CONCENTRATION_CAP)
    }

    fn diversification_factor(&self, protocol_count_after_move: u32) -> Decimal {
        if protocol_count_after_move >= self.diversification_target {
            return Decimal::ZERO;
        }
        if self.diversification_target == 0 {
            return Decimal::ZERO;
        }
        let deficit = self.diversification_target - protocol_count_after_move;
        let ratio = Decimal::from(deficit) / Decimal::from(self.diversification_target);
        (ratio * DIVERSIFICATION_CAP).clamp(Decimal::ZERO, DIVERSIFICATION_CAP)
    }

    fn recommendation_for(score: i64) -> String {
        match score {
            s if s > 75 => "veto: risk is critical".to_string(),
            s if s > 50 => "proceed only with allow_high_risk".to_string(),
            s if s > 25 => "proceed with standard monitoring".to_string(),
            _ => "proceed".to_string(),
        }
    }
}
