use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Itemized cost breakdown for a candidate rebalance move. `total_cost` is
/// always the sum of the other six fields — constructors enforce this so the
/// invariant can never be observed broken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalancingCosts {
    pub gas_withdraw: Decimal,
    pub gas_approve: Decimal,
    pub gas_swap: Decimal,
    pub gas_deposit: Decimal,
    pub slippage: Decimal,
    pub protocol_fees: Decimal,
    total_cost: Decimal,
}

impl RebalancingCosts {
    pub fn new(
        gas_withdraw: Decimal,
        gas_approve: Decimal,
        gas_swap: Decimal,
        gas_deposit: Decimal,
        slippage: Decimal,
        protocol_fees: Decimal,
    ) -> Self {
        let total_cost =
            gas_withdraw + gas_approve + gas_swap + gas_deposit + slippage + protocol_fees;
        Self {
            gas_withdraw,
            gas_approve,
            gas_swap,
            gas_deposit,
            slippage,
            protocol_fees,
            total_cost,
        }
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }
}

/// Break-even period for a rebalance, in days, or "never" when the move
/// never recovers its one-time cost (zero or negative annual gain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakEvenDays {
    Days(u64),
    Never,
}

impl BreakEvenDays {
    pub fn exceeds(&self, max_days: u64) -> bool {
        match self {
            BreakEvenDays::Days(d) => *d > max_days,
            BreakEvenDays::Never => true,
        }
    }
}

impl std::fmt::Display for BreakEvenDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakEvenDays::Days(d) => write!(f, "{d} days"),
            BreakEvenDays::Never => write!(f, "never"),
        }
    }
}

/// Full profitability analysis for one candidate move, produced by the
/// Profitability Calculator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveProfitability {
    pub apy_improvement: Decimal,
    pub position_size: Decimal,
    pub annual_gain_usd: Decimal,
    pub costs: RebalancingCosts,
    pub net_gain_first_year: Decimal,
    pub break_even_days: BreakEvenDays,
    /// `None` when costs are zero (infinite ROI, rendered as sentinel by callers).
    pub roi_on_costs: Option<Decimal>,
    pub rejection_reasons: Vec<String>,
}

impl MoveProfitability {
    pub fn is_profitable(&self) -> bool {
        self.rejection_reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_cost_is_sum_of_six_fields() {
        let costs = RebalancingCosts::new(
            dec!(1), dec!(2), dec!(3), dec!(4), dec!(5), dec!(6),
        );
        assert_eq!(costs.total_cost(), dec!(21));
    }

    #[test]
    fn break_even_never_always_exceeds() {
        assert!(BreakEvenDays::Never.exceeds(u64::MAX));
        assert!(!BreakEvenDays::Days(5).exceeds(30));
        assert!(BreakEvenDays::Days(31).exceeds(30));
    }
}
