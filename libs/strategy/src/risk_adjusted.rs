use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use yieldkeeper_config::{ProfitabilityConfig, RiskConfig, StrategyConfig};
use yieldkeeper_interfaces::GasSource;
use yieldkeeper_profitability::{ProfitabilityCalculator, ProfitabilityInputs};
use yieldkeeper_risk::{RiskAssessor, RiskInputs, SwapNeed};
use yieldkeeper_types::{Position, RebalanceRecommendation, RiskLevel, YieldOpportunity};

use crate::simple::{best_opportunity_for, protocol_fee_pct};
use crate::traits::{confidence_score, Strategy};

/// Number of top-APY protocols new capital is spread across by default
/// (§4.7: "top N protocols, default 3"). Not a recognized configuration
/// option in its own right — constructed with [`RiskAdjustedStrategy::new`]
/// and overridable with [`RiskAdjustedStrategy::with_top_n`].
const DEFAULT_TOP_N: usize = 3;

fn utilization_pct(opportunity: &YieldOpportunity) -> Option<Decimal> {
    opportunity
        .metadata
        .get("utilization_pct")
        .and_then(|raw| raw.parse::<Decimal>().ok())
}

/// Max single-protocol share of total portfolio value, and the number of
/// distinct protocols holding a position, as they would be *after*
/// withdrawing `amount_usd` from `from_protocol` (`None` for new capital)
/// and depositing it into `to_protocol`.
fn simulate_concentration(
    positions: &[Position],
    from_protocol: Option<&str>,
    to_protocol: &str,
    amount_usd: Decimal,
) -> (Decimal, u32) {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for position in positions {
        if position.is_closed() {
            continue;
        }
        *totals.entry(position.protocol.clone()).or_insert(Decimal::ZERO) += position.value_usd;
    }

    if let Some(from) = from_protocol {
        if let Some(value) = totals.get_mut(from) {
            *value -= amount_usd;
        }
    }
    *totals.entry(to_protocol.to_string()).or_insert(Decimal::ZERO) += amount_usd;

    let total_value: Decimal = totals.values().copied().sum();
    if total_value <= Decimal::ZERO {
        return (Decimal::ZERO, totals.len() as u32);
    }

    let max_value = totals.values().copied().fold(Decimal::ZERO, Decimal::max);
    let protocol_count = totals.values().filter(|v| **v > Decimal::ZERO).count() as u32;
    ((max_value / total_value).clamp(Decimal::ZERO, Decimal::ONE), protocol_count)
}

/// Whether `max_share` alone (independent of the other six risk factors)
/// would be judged CRITICAL, i.e. one protocol holding more than 75% of the
/// post-move portfolio.
fn concentration_would_be_critical(max_share: Decimal) -> bool {
    let pct = (max_share * Decimal::from(100))
        .round()
        .to_string()
        .parse::<i64>()
        .unwrap_or(100);
    RiskLevel::from_score(pct.clamp(0, 100) as u8) == RiskLevel::Critical
}

/// Conservative strategy: same enumeration as `SimpleYieldStrategy`, but
/// every candidate passes through the Risk Assessor before being emitted,
/// and new capital is diversified across several protocols rather than
/// concentrated in one (§4.7).
pub struct RiskAdjustedStrategy<'a> {
    strategy_config: &'a StrategyConfig,
    risk_config: &'a RiskConfig,
    profitability: ProfitabilityCalculator<'a>,
    top_n: usize,
}

impl<'a> RiskAdjustedStrategy<'a> {
    pub fn new(
        strategy_config: &'a StrategyConfig,
        profitability_config: &'a ProfitabilityConfig,
        risk_config: &'a RiskConfig,
    ) -> Self {
        Self {
            strategy_config,
            risk_config,
            profitability: ProfitabilityCalculator::new(profitability_config),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    fn risk_assessor(&self) -> RiskAssessor<'a> {
        RiskAssessor::new(self.risk_config, self.strategy_config.diversification_target)
    }
}

#[async_trait]
impl<'a> Strategy for RiskAdjustedStrategy<'a> {
    fn name(&self) -> &str {
        "risk-adjusted"
    }

    async fn rebalance_recommendations(
        &self,
        positions: &[Position],
        opportunities: &[YieldOpportunity],
        gas_source: &dyn GasSource,
    ) -> Vec<RebalanceRecommendation> {
        let assessor = self.risk_assessor();
        let mut recommendations = Vec::new();

        for position in positions {
            if position.is_closed() || position.value_usd < self.strategy_config.min_rebalance_amount {
                continue;
            }

            let Some(best) =
                best_opportunity_for(opportunities, &position.token, Some(&position.protocol))
            else {
                continue;
            };

            let improvement = best.apy - position.current_apy;
            if improvement < self.strategy_config.min_apy_improvement {
                continue;
            }

            let profitability = self
                .profitability
                .calculate(
                    ProfitabilityInputs {
                        current_apy: position.current_apy,
                        target_apy: best.apy,
                        position_size_usd: position.value_usd,
                        requires_swap: false,
                        swap_amount_usd: None,
                        protocol_fee_pct: protocol_fee_pct(best),
                    },
                    gas_source,
                )
                .await;

            if !profitability.is_profitable() {
                continue;
            }

            let (max_share, protocol_count) = simulate_concentration(
                positions,
                Some(&position.protocol),
                &best.protocol,
                position.value_usd,
            );

            if concentration_would_be_critical(max_share) {
                tracing::warn!(
                    protocol = %best.protocol,
                    max_share = %max_share,
                    "risk-adjusted: skipping move, post-move concentration would be critical"
                );
                continue;
            }

            let assessment = assessor.assess(&RiskInputs {
                protocol: &best.protocol,
                tvl_usd: best.tvl_usd,
                utilization_pct: utilization_pct(best),
                position_size_usd: position.value_usd,
                swap_need: SwapNeed::SameToken,
                max_protocol_share_after_move: max_share,
                protocol_count_after_move: protocol_count,
            });

            if !RiskAssessor::should_proceed(&assessment, self.strategy_config.allow_high_risk) {
                tracing::debug!(
                    protocol = %best.protocol,
                    risk_score = assessment.risk_score,
                    "risk-adjusted: vetoed by risk assessor"
                );
                continue;
            }

            let confidence =
                confidence_score(improvement, &profitability, Some(assessment.risk_level));

            recommendations.push(RebalanceRecommendation {
                from_protocol: Some(position.protocol.clone()),
                to_protocol: best.protocol.clone(),
                token: position.token.clone(),
                amount_usd: position.value_usd,
                current_apy: Some(position.current_apy),
                expected_apy: best.apy,
                reason: format!(
                    "{:.2}% -> {:.2}% APY, risk {} ({}), net gain ${:.2}/yr",
                    position.current_apy,
                    best.apy,
                    assessment.risk_level,
                    assessment.risk_score,
                    profitability.net_gain_first_year
                ),
                confidence,
            });
        }

        recommendations
    }

    fn allocate_new_capital(
        &self,
        amount_usd: Decimal,
        token: &str,
        opportunities: &[YieldOpportunity],
    ) -> Vec<RebalanceRecommendation> {
        let mut candidates: Vec<&YieldOpportunity> = opportunities
            .iter()
            .filter(|o| o.tokens.iter().any(|t| t == token))
            .collect();
        candidates.sort_by(|a, b| b.apy.cmp(&a.apy));
        candidates.truncate(self.top_n);

        if candidates.is_empty() {
            return Vec::new();
        }

        let apy_sum: Decimal = candidates.iter().map(|o| o.apy.max(Decimal::ZERO)).sum();
        let cap = self.strategy_config.max_concentration_pct;
        let last_index = candidates.len() - 1;

        let mut allocated = Decimal::ZERO;
        let mut recommendations = Vec::new();

        for (index, opportunity) in candidates.iter().enumerate() {
            let is_last = index == last_index;

            let weight = if apy_sum > Decimal::ZERO {
                opportunity.apy.max(Decimal::ZERO) / apy_sum
            } else {
                Decimal::ONE / Decimal::from(candidates.len() as u64)
            };

            let share = if is_last {
                amount_usd - allocated
            } else {
                (amount_usd * weight).min(amount_usd * cap)
            };
            allocated += share;

            if share <= Decimal::ZERO {
                continue;
            }

            recommendations.push(RebalanceRecommendation {
                from_protocol: None,
                to_protocol: opportunity.protocol.clone(),
                token: token.to_string(),
                amount_usd: share,
                current_apy: None,
                expected_apy: opportunity.apy,
                reason: format!(
                    "new capital diversified across top {} protocols ({:.1}% weight)",
                    candidates.len(),
                    weight * Decimal::from(100)
                ),
                confidence: 55,
            });
        }

        recommendations
    }
}
