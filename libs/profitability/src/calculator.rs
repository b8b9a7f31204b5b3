use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use yieldkeeper_config::ProfitabilityConfig;
use yieldkeeper_interfaces::GasSource;
use yieldkeeper_types::{BreakEvenDays, MoveProfitability, RebalancingCosts};

/// Gas-unit estimates for the four step types, independent of any one
/// adapter's dry-run figures — this is the Profitability Calculator's own
/// generic estimate, used before a concrete adapter/route is chosen.
const GAS_UNITS_WITHDRAW: u64 = 150_000;
const GAS_UNITS_APPROVE: u64 = 50_000;
const GAS_UNITS_SWAP: u64 = 200_000;
const GAS_UNITS_DEPOSIT: u64 = 150_000;

pub struct ProfitabilityInputs {
    pub current_apy: Decimal,
    pub target_apy: Decimal,
    pub position_size_usd: Decimal,
    pub requires_swap: bool,
    pub swap_amount_usd: Option<Decimal>,
    pub protocol_fee_pct: Decimal,
}

pub struct ProfitabilityCalculator<'a> {
    config: &'a ProfitabilityConfig,
}

impl<'a> ProfitabilityCalculator<'a> {
    pub fn new(config: &'a ProfitabilityConfig) -> Self {
        Self { config }
    }

    pub async fn calculate(
        &self,
        inputs: ProfitabilityInputs,
        gas_source: &dyn GasSource,
    ) -> MoveProfitability {
        let apy_improvement = inputs.target_apy - inputs.current_apy;
        let annual_gain_usd = inputs.position_size_usd * (apy_improvement / Decimal::from(100));

        let swap_amount_usd = inputs.swap_amount_usd.unwrap_or(inputs.position_size_usd);
        let costs = self
            .calculate_costs(
                inputs.position_size_usd,
                inputs.requires_swap,
                swap_amount_usd,
                inputs.protocol_fee_pct,
                gas_source,
            )
            .await;

        let net_gain_first_year = annual_gain_usd - costs.total_cost();

        let break_even_days = if annual_gain_usd > Decimal::ZERO {
            let days = (costs.total_cost() / annual_gain_usd * Decimal::from(365)).ceil();
            BreakEvenDays::Days(days.to_u64().unwrap_or(u64::MAX))
        } else {
            BreakEvenDays::Never
        };

        let roi_on_costs = if costs.total_cost() > Decimal::ZERO {
            Some((net_gain_first_year / costs.total_cost()) * Decimal::from(100))
        } else {
            None
        };

        let mut rejection_reasons = Vec::new();

        if apy_improvement <= Decimal::ZERO {
            rejection_reasons.push(format!(
                "No APY improvement (current: {}%, target: {}%)",
                inputs.current_apy, inputs.target_apy
            ));
        }

        if net_gain_first_year < self.config.min_annual_gain_usd {
            rejection_reasons.push(format!(
                "Net gain ${net_gain_first_year:.2}/year < minimum ${}",
                self.config.min_annual_gain_usd
            ));
        }

        if break_even_days.exceeds(self.config.max_break_even_days) {
            rejection_reasons.push(format!(
                "Break-even {break_even_days} > maximum {} days",
                self.config.max_break_even_days
            ));
        }

        let cost_pct = if inputs.position_size_usd > Decimal::ZERO {
            costs.total_cost() / inputs.position_size_usd
        } else {
            Decimal::ZERO
        };
        if cost_pct > self.config.max_cost_pct {
            rejection_reasons.push(format!(
                "Costs {:.2}% of position > maximum {:.2}%",
                cost_pct * Decimal::from(100),
                self.config.max_cost_pct * Decimal::from(100)
            ));
        }

        if rejection_reasons.is_empty() {
            tracing::info!(
                apy_from = %inputs.current_apy,
                apy_to = %inputs.target_apy,
                net_gain = %net_gain_first_year,
                break_even = %break_even_days,
                "profitable rebalance candidate"
            );
        } else {
            tracing::warn!(reasons = ?rejection_reasons, "unprofitable rebalance candidate");
        }

        MoveProfitability {
            apy_improvement,
            position_size: inputs.position_size_usd,
            annual_gain_usd,
            costs,
            net_gain_first_year,
            break_even_days,
            roi_on_costs,
            rejection_reasons,
        }
    }

    async fn calculate_costs(
        &self,
        position_size_usd: Decimal,
        requires_swap: bool,
        swap_amount_usd: Decimal,
        protocol_fee_pct: Decimal,
        gas_source: &dyn GasSource,
    ) -> RebalancingCosts {
        let gas_withdraw = gas_source.calculate_gas_cost(GAS_UNITS_WITHDRAW).await.ok();
        let gas_deposit = gas_source.calculate_gas_cost(GAS_UNITS_DEPOSIT).await.ok();

        let (gas_approve, gas_swap, slippage_cost) = if requires_swap {
            let approve = gas_source.calculate_gas_cost(GAS_UNITS_APPROVE).await.ok();
            let swap = gas_source.calculate_gas_cost(GAS_UNITS_SWAP).await.ok();
            let slippage_pct = Decimal::from(self.config.default_slippage_bps) / Decimal::from(10_000);
            (
                approve.unwrap_or(Decimal::ZERO),
                swap.unwrap_or(Decimal::ZERO),
                swap_amount_usd * slippage_pct,
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

        let protocol_fees = position_size_usd * (protocol_fee_pct / Decimal::from(100));

        RebalancingCosts::new(
            gas_withdraw.unwrap_or(Decimal::ZERO),
            gas_approve,
            gas_swap,
            gas_deposit.unwrap_or(Decimal::ZERO),
            slippage_cost,
            protocol_fees,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use yieldkeeper_interfaces::Result as InterfaceResult;

    struct StaticGasSource;

    #[async_trait]
    impl GasSource for StaticGasSource {
        async fn get_gas_price(&self) -> InterfaceResult<ethers::types::U256> {
            Ok(ethers::types::U256::from(1))
        }
        async fn estimate_gas(
            &self,
            _to: &str,
            _value: ethers::types::U256,
            _data: &ethers::types::Bytes,
        ) -> InterfaceResult<u64> {
            Ok(21_000)
        }
        async fn calculate_gas_cost(&self, units: u64) -> InterfaceResult<Decimal> {
            Ok(Decimal::from(units) * dec!(0.00000005))
        }
    }

    fn config() -> ProfitabilityConfig {
        ProfitabilityConfig {
            min_annual_gain_usd: dec!(10),
            max_break_even_days: 30,
            max_cost_pct: dec!(0.01),
            default_slippage_bps: 30,
        }
    }

    #[tokio::test]
    async fn profitable_move_has_no_rejection_reasons() {
        let cfg = config();
        let calc = ProfitabilityCalculator::new(&cfg);
        let result = calc
            .calculate(
                ProfitabilityInputs {
                    current_apy: dec!(3.0),
                    target_apy: dec!(8.0),
                    position_size_usd: dec!(50_000),
                    requires_swap: false,
                    swap_amount_usd: None,
                    protocol_fee_pct: dec!(0),
                },
                &StaticGasSource,
            )
            .await;

        assert!(result.is_profitable(), "{:?}", result.rejection_reasons);
    }

    #[tokio::test]
    async fn zero_improvement_is_rejected() {
        let cfg = config();
        let calc = ProfitabilityCalculator::new(&cfg);
        let result = calc
            .calculate(
                ProfitabilityInputs {
                    current_apy: dec!(5.0),
                    target_apy: dec!(5.0),
                    position_size_usd: dec!(50_000),
                    requires_swap: false,
                    swap_amount_usd: None,
                    protocol_fee_pct: dec!(0),
                },
                &StaticGasSource,
            )
            .await;

        assert!(!result.is_profitable());
        assert!(result
            .rejection_reasons
            .iter()
            .any(|r| r.contains("No APY improvement")));
    }

    #[tokio::test]
    async fn tiny_position_fails_net_gain_gate() {
        let cfg = config();
        let calc = ProfitabilityCalculator::new(&cfg);
        let result = calc
            .calculate(
                ProfitabilityInputs {
                    current_apy: dec!(3.0),
                    target_apy: dec!(4.0),
                    position_size_usd: dec!(100),
                    requires_swap: false,
                    swap_amount_usd: None,
                    protocol_fee_pct: dec!(0),
                },
                &StaticGasSource,
            )
            .await;

        assert!(!result.is_profitable());
    }

    #[tokio::test]
    async fn swap_pulls_in_approve_swap_gas_and_slippage() {
        let cfg = config();
        let calc = ProfitabilityCalculator::new(&cfg);
        let result = calc
            .calculate(
                ProfitabilityInputs {
                    current_apy: dec!(3.0),
                    target_apy: dec!(9.0),
                    position_size_usd: dec!(100_000),
                    requires_swap: true,
                    swap_amount_usd: Some(dec!(100_000)),
                    protocol_fee_pct: dec!(0),
                },
                &StaticGasSource,
            )
            .await;

        assert!(result.costs.gas_approve > Decimal::ZERO);
        assert!(result.costs.gas_swap > Decimal::ZERO);
        assert!(result.costs.slippage > Decimal::ZERO);
    }
}
