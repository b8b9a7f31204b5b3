use async_trait::async_trait;
use rust_decimal::Decimal;

use yieldkeeper_config::StrategyConfig;
use yieldkeeper_interfaces::GasSource;
use yieldkeeper_profitability::{ProfitabilityCalculator, ProfitabilityInputs};
use yieldkeeper_types::{Position, RebalanceRecommendation, YieldOpportunity};

use crate::traits::{confidence_score, Strategy};

/// Opportunity metadata key an adapter may set to report a protocol's
/// deposit/withdrawal fee, consumed by the Profitability Calculator's cost
/// gate. Absent means zero fee.
const PROTOCOL_FEE_METADATA_KEY: &str = "protocol_fee_pct";

pub(crate) fn protocol_fee_pct(opportunity: &YieldOpportunity) -> Decimal {
    opportunity
        .metadata
        .get(PROTOCOL_FEE_METADATA_KEY)
        .and_then(|raw| raw.parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO)
}

/// Best single-protocol opportunity for `token`, excluding `exclude_protocol`
/// (a position's own current protocol). Ties keep the first candidate
/// encountered, matching the scanner's stable-sort tiebreak.
pub(crate) fn best_opportunity_for<'a>(
    opportunities: &'a [YieldOpportunity],
    token: &str,
    exclude_protocol: Option<&str>,
) -> Option<&'a YieldOpportunity> {
    opportunities
        .iter()
        .filter(|o| o.tokens.iter().any(|t| t == token))
        .filter(|o| exclude_protocol != Some(o.protocol.as_str()))
        .fold(None::<&YieldOpportunity>, |best, candidate| match best {
            Some(b) if b.apy >= candidate.apy => Some(b),
            _ => Some(candidate),
        })
}

/// Aggressive strategy: always moves to the single highest-APY supported
/// protocol for a token, with no risk screening beyond the Profitability
/// Calculator's four gates (§4.7).
pub struct SimpleYieldStrategy<'a> {
    config: &'a StrategyConfig,
    profitability: ProfitabilityCalculator<'a>,
}

impl<'a> SimpleYieldStrategy<'a> {
    pub fn new(
        config: &'a StrategyConfig,
        profitability_config: &'a yieldkeeper_config::ProfitabilityConfig,
    ) -> Self {
        Self {
            config,
            profitability: ProfitabilityCalculator::new(profitability_config),
        }
    }
}

#[async_trait]
impl<'a> Strategy for SimpleYieldStrategy<'a> {
    fn name(&self) -> &str {
        "simple-yield"
    }

    async fn rebalance_recommendations(
        &self,
        positions: &[Position],
        opportunities: &[YieldOpportunity],
        gas_source: &dyn GasSource,
    ) -> Vec<RebalanceRecommendation> {
        let mut recommendations = Vec::new();

        for position in positions {
            if position.is_closed() || position.value_usd < self.config.min_rebalance_amount {
                continue;
            }

            let Some(best) =
                best_opportunity_for(opportunities, &position.token, Some(&position.protocol))
            else {
                continue;
            };

            let improvement = best.apy - position.current_apy;
            if improvement < self.config.min_apy_improvement {
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
                tracing::debug!(
                    protocol = %position.protocol,
                    target = %best.protocol,
                    reasons = ?profitability.rejection_reasons,
                    "simple-yield: candidate move unprofitable"
                );
                continue;
            }

            let confidence = confidence_score(improvement, &profitability, None);

            recommendations.push(RebalanceRecommendation {
                from_protocol: Some(position.protocol.clone()),
                to_protocol: best.protocol.clone(),
                token: position.token.clone(),
                amount_usd: position.value_usd,
                current_apy: Some(position.current_apy),
                expected_apy: best.apy,
                reason: format!(
                    "{:.2}% -> {:.2}% APY, net gain ${:.2}/yr, break-even {}",
                    position.current_apy,
                    best.apy,
                    profitability.net_gain_first_year,
                    profitability.break_even_days
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
        let Some(best) = best_opportunity_for(opportunities, token, None) else {
            return Vec::new();
        };

        vec![RebalanceRecommendation {
            from_protocol: None,
            to_protocol: best.protocol.clone(),
            token: token.to_string(),
            amount_usd,
            current_apy: None,
            expected_apy: best.apy,
            reason: format!("new capital -> highest APY protocol ({:.2}%)", best.apy),
            confidence: 60,
        }]
    }
}
