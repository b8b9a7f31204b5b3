use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::recommendation::RebalanceRecommendation;

/// Canonical order of steps in a rebalance pipeline. Declaration order here
/// is the order the executor must emit them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceStep {
    Validation,
    BalanceCheck,
    Withdraw,
    ApproveSwap,
    Swap,
    ApproveDeposit,
    Deposit,
    Verification,
}

impl RebalanceStep {
    pub const ORDER: [RebalanceStep; 8] = [
        RebalanceStep::Validation,
        RebalanceStep::BalanceCheck,
        RebalanceStep::Withdraw,
        RebalanceStep::ApproveSwap,
        RebalanceStep::Swap,
        RebalanceStep::ApproveDeposit,
        RebalanceStep::Deposit,
        RebalanceStep::Verification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceStep::Validation => "validation",
            RebalanceStep::BalanceCheck => "balance_check",
            RebalanceStep::Withdraw => "withdraw",
            RebalanceStep::ApproveSwap => "approve_swap",
            RebalanceStep::Swap => "swap",
            RebalanceStep::ApproveDeposit => "approve_deposit",
            RebalanceStep::Deposit => "deposit",
            RebalanceStep::Verification => "verification",
        }
    }
}

/// Outcome of a single pipeline step, appended to the execution's step log
/// before the next step begins so partial progress is always observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: RebalanceStep,
    pub success: bool,
    pub tx_hash: Option<String>,
    pub gas_used: Option<u64>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    pub fn ok(step: RebalanceStep, tx_hash: Option<String>, gas_used: Option<u64>) -> Self {
        Self {
            step,
            success: true,
            tx_hash,
            gas_used,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(step: RebalanceStep, error: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            tx_hash: None,
            gas_used: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered log of an in-progress or completed rebalance. `total_gas_used`
/// always equals the sum of recorded step gas; `success` is true only once
/// every recorded step has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceExecution {
    pub recommendation: RebalanceRecommendation,
    pub steps: Vec<StepResult>,
    pub total_gas_used: u64,
    pub total_gas_cost_eth: Decimal,
    pub total_gas_cost_usd: Decimal,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub success: bool,
}

impl RebalanceExecution {
    pub fn new(recommendation: RebalanceRecommendation) -> Self {
        Self {
            recommendation,
            steps: Vec::new(),
            total_gas_used: 0,
            total_gas_cost_eth: Decimal::ZERO,
            total_gas_cost_usd: Decimal::ZERO,
            started_at: Utc::now(),
            completed_at: None,
            success: false,
        }
    }

    pub fn record_step(&mut self, result: StepResult) {
        if let Some(gas) = result.gas_used {
            self.total_gas_used += gas;
        }
        self.steps.push(result);
    }

    pub fn finish(&mut self) {
        self.success = self.steps.iter().all(|s| s.success) && !self.steps.is_empty();
        self.completed_at = Some(Utc::now());
    }

    pub fn step_result(&self, step: RebalanceStep) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn last_step(&self) -> Option<&StepResult> {
        self.steps.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::RebalanceRecommendation;
    use rust_decimal_macros::dec;

    fn rec() -> RebalanceRecommendation {
        RebalanceRecommendation {
            from_protocol: Some("aave".into()),
            to_protocol: "moonwell".into(),
            token: "USDC".into(),
            amount_usd: dec!(1000),
            current_apy: Some(dec!(4)),
            expected_apy: dec!(8),
            reason: "test".into(),
            confidence: 80,
        }
    }

    #[test]
    fn aggregate_gas_is_sum_of_steps() {
        let mut exec = RebalanceExecution::new(rec());
        exec.record_step(StepResult::ok(RebalanceStep::Validation, None, Some(10)));
        exec.record_step(StepResult::ok(RebalanceStep::BalanceCheck, None, Some(5)));
        assert_eq!(exec.total_gas_used, 15);
    }

    #[test]
    fn success_requires_every_step_to_succeed() {
        let mut exec = RebalanceExecution::new(rec());
        exec.record_step(StepResult::ok(RebalanceStep::Validation, None, None));
        exec.record_step(StepResult::failed(RebalanceStep::Withdraw, "boom"));
        exec.finish();
        assert!(!exec.success);
    }

    #[test]
    fn empty_execution_is_not_success() {
        let mut exec = RebalanceExecution::new(rec());
        exec.finish();
        assert!(!exec.success);
    }
}
