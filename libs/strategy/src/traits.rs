use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use yieldkeeper_interfaces::GasSource;
use yieldkeeper_types::{BreakEvenDays, MoveProfitability, Position, RebalanceRecommendation, RiskLevel, YieldOpportunity};

/// One Strategy implementation, consumed by the Scheduled Optimizer (§4.9).
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate every existing position above the configured minimum for a
    /// better opportunity, proving profitability before emitting a
    /// recommendation.
    async fn rebalance_recommendations(
        &self,
        positions: &[Position],
        opportunities: &[YieldOpportunity],
        gas_source: &dyn GasSource,
    ) -> Vec<RebalanceRecommendation>;

    /// Allocate uncommitted capital (no existing position to withdraw
    /// from) across the opportunity set.
    fn allocate_new_capital(
        &self,
        amount_usd: Decimal,
        token: &str,
        opportunities: &[YieldOpportunity],
    ) -> Vec<RebalanceRecommendation>;
}

/// Quick pre-screen before running the full Profitability Calculator:
/// false if the APY improvement doesn't clear `min_apy_improvement`, or if
/// the annualized gain wouldn't even cover a flat gas estimate.
pub fn should_rebalance(
    current_apy: Decimal,
    target_apy: Decimal,
    gas_cost_usd: Decimal,
    amount_usd: Decimal,
    min_apy_improvement: Decimal,
) -> bool {
    let improvement = target_apy - current_apy;
    if improvement < min_apy_improvement {
        return false;
    }
    let annual_gain = amount_usd * (improvement / Decimal::from(100));
    annual_gain >= gas_cost_usd
}

/// Base 40-60 confidence scaled by APY improvement magnitude, plus additive
/// bonuses (up to +30) for high net gain, a fast break-even, and — when the
/// caller supplies one — a favorable risk assessment. Always clamped to
/// 0..=100.
pub fn confidence_score(
    apy_improvement: Decimal,
    profitability: &MoveProfitability,
    risk_level: Option<RiskLevel>,
) -> u8 {
    let improvement_units = apy_improvement.max(Decimal::ZERO).min(Decimal::from(20));
    let base = Decimal::from(40) + improvement_units;

    let mut bonus = Decimal::ZERO;
    if profitability.net_gain_first_year >= Decimal::from(1000) {
        bonus += Decimal::from(15);
    } else if profitability.net_gain_first_year >= Decimal::from(100) {
        bonus += Decimal::from(7);
    }

    match profitability.break_even_days {
        BreakEvenDays::Days(d) if d <= 7 => bonus += Decimal::from(10),
        BreakEvenDays::Days(d) if d <= 14 => bonus += Decimal::from(5),
        _ => {}
    }

    if let Some(level) = risk_level {
        if level == RiskLevel::Low {
            bonus += Decimal::from(5);
        }
    }

    let bonus = bonus.min(Decimal::from(30));
    let total = (base + bonus).clamp(Decimal::ZERO, Decimal::from(100));
    total.to_u8().unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use yieldkeeper_types::RebalancingCosts;

    fn profitability(net_gain: Decimal, break_even: BreakEvenDays) -> MoveProfitability {
        MoveProfitability {
            apy_improvement: dec!(4),
            position_size: dec!(10000),
            annual_gain_usd: net_gain,
            costs: RebalancingCosts::new(dec!(1), dec!(1), dec!(0), dec!(1), dec!(0), dec!(0)),
            net_gain_first_year: net_gain,
            break_even_days: break_even,
            roi_on_costs: None,
            rejection_reasons: Vec::new(),
        }
    }

    #[test]
    fn should_rebalance_rejects_below_threshold_improvement() {
        assert!(!should_rebalance(
            dec!(4),
            dec!(4.2),
            dec!(1),
            dec!(10000),
            dec!(0.5)
        ));
    }

    #[test]
    fn should_rebalance_rejects_when_gain_below_gas() {
        // 0.1% improvement on $1000 = $1/year, which is less than $5 gas.
        assert!(!should_rebalance(
            dec!(4),
            dec!(4.1),
            dec!(5),
            dec!(1000),
            dec!(0.05)
        ));
    }

    #[test]
    fn should_rebalance_accepts_clear_win() {
        assert!(should_rebalance(
            dec!(4),
            dec!(8),
            dec!(5),
            dec!(10000),
            dec!(0.5)
        ));
    }

    #[test]
    fn confidence_scales_with_improvement_and_bonuses() {
        let weak = confidence_score(dec!(0.5), &profitability(dec!(20), BreakEvenDays::Days(300)), None);
        let strong = confidence_score(
            dec!(10),
            &profitability(dec!(2000), BreakEvenDays::Days(5)),
            Some(RiskLevel::Low),
        );
        assert!(strong > weak);
        assert!(strong <= 100);
    }
}
