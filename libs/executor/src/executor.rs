use std::sync::Arc;

use rust_decimal::Decimal;

use yieldkeeper_adapters::{synthetic_tx_hash, AdapterRegistry};
use yieldkeeper_config::SpendingLimitsConfig;
use yieldkeeper_interfaces::{AdapterOp, GasSource, PriceSource, ProtocolAdapter};
use yieldkeeper_types::{to_raw, RebalanceExecution, RebalanceRecommendation, RebalanceStep, StepResult, YieldOpportunity};

use crate::spending::{ApprovalRequirement, SpendingLimits, REQUIRES_APPROVAL_MARKER};

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Operational wiring an `ExecutionRequest` needs beyond the recommendation
/// itself. `RebalanceRecommendation` (§3) carries neither an on-chain owner
/// address nor the moved token's decimals — both are execution-time details
/// the Strategy layer has no reason to know about.
pub struct ExecutionRequest {
    pub recommendation: RebalanceRecommendation,
    pub owner_address: String,
    pub token_decimals: u32,
    /// Set once a human has signed off on a transaction at or above
    /// `approval_threshold_usd`. Ignored below that threshold.
    pub human_approved: bool,
}

struct ResolvedRoute {
    to_adapter: Arc<dyn ProtocolAdapter>,
    to_pool_id: String,
    from: Option<(Arc<dyn ProtocolAdapter>, String)>,
}

/// Runs one recommendation through the eight-step pipeline. Holds no
/// mutable position state itself — balances are always re-read from the
/// adapter, never assumed — and a failed step stops the pipeline without
/// attempting to unwind steps that already succeeded (§4.8, "no rollback").
pub struct RebalanceExecutor<'a> {
    registry: &'a AdapterRegistry,
    spending: SpendingLimits<'a>,
    read_only: bool,
}

impl<'a> RebalanceExecutor<'a> {
    pub fn new(registry: &'a AdapterRegistry, spending_config: &'a SpendingLimitsConfig, read_only: bool) -> Self {
        Self {
            registry,
            spending: SpendingLimits::new(spending_config),
            read_only,
        }
    }

    pub fn spending_limits(&self) -> &SpendingLimits<'a> {
        &self.spending
    }

    pub async fn execute(
        &self,
        request: ExecutionRequest,
        gas_source: &dyn GasSource,
        price_source: &dyn PriceSource,
    ) -> RebalanceExecution {
        let rec = request.recommendation.clone();
        let mut execution = RebalanceExecution::new(rec.clone());

        let route = match self.validate(&request).await {
            Ok(route) => {
                execution.record_step(StepResult::ok(RebalanceStep::Validation, None, None));
                self.spending.record_spend(rec.amount_usd);
                route
            }
            Err(reason) => {
                execution.record_step(StepResult::failed(RebalanceStep::Validation, reason));
                execution.finish();
                return execution;
            }
        };

        let Some(amount_raw) = self.amount_to_raw(&rec, request.token_decimals, price_source).await else {
            execution.record_step(StepResult::failed(
                RebalanceStep::BalanceCheck,
                format!("no usable {} price to size the transfer", rec.token),
            ));
            execution.finish();
            return execution;
        };

        if !self
            .balance_check(&route, &rec, &request.owner_address, amount_raw, &mut execution)
            .await
        {
            execution.finish();
            return execution;
        }

        if let Some((from_adapter, from_pool)) = &route.from {
            match from_adapter.withdraw(from_pool, &rec.token, amount_raw).await {
                Ok(tx_hash) => {
                    let gas = from_adapter.estimate_gas(AdapterOp::Withdraw, rec.amount_usd).await.ok();
                    execution.record_step(StepResult::ok(RebalanceStep::Withdraw, Some(tx_hash), gas));
                }
                Err(err) => {
                    execution.record_step(StepResult::failed(RebalanceStep::Withdraw, err.to_string()));
                    execution.finish();
                    return execution;
                }
            }
        }

        // Cross-token rebalancing (APPROVE_SWAP / SWAP) is a documented
        // extension point. `RebalanceRecommendation` carries a single
        // `token` field, so every recommendation this core produces moves
        // the same token between protocols and neither step ever applies.

        match route.to_adapter.estimate_gas(AdapterOp::Approve, rec.amount_usd).await {
            Ok(gas) => {
                // Approval is idempotent and max-uint in this core: once
                // granted to a spender it never needs renewing, so this step
                // only records the first-time gas cost for the audit trail.
                let tx_hash = route.to_adapter.is_dry_run().then(synthetic_tx_hash);
                execution.record_step(StepResult::ok(RebalanceStep::ApproveDeposit, tx_hash, Some(gas)));
            }
            Err(err) => {
                execution.record_step(StepResult::failed(RebalanceStep::ApproveDeposit, err.to_string()));
                execution.finish();
                return execution;
            }
        }

        match route.to_adapter.deposit(&route.to_pool_id, &rec.token, amount_raw).await {
            Ok(tx_hash) => {
                let gas = route.to_adapter.estimate_gas(AdapterOp::Deposit, rec.amount_usd).await.ok();
                execution.record_step(StepResult::ok(RebalanceStep::Deposit, Some(tx_hash), gas));
            }
            Err(err) => {
                execution.record_step(StepResult::failed(RebalanceStep::Deposit, err.to_string()));
                execution.finish();
                return execution;
            }
        }

        match route
            .to_adapter
            .get_user_balance(&route.to_pool_id, &request.owner_address)
            .await
        {
            Ok(balance) if balance < amount_raw => {
                tracing::warn!(
                    protocol = %rec.to_protocol,
                    expected = amount_raw,
                    observed = balance,
                    "post-deposit balance below expected amount"
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "post-deposit verification read failed");
            }
            Ok(_) => {}
        }
        // Verification never fails the pipeline — a discrepancy is logged,
        // not raised, since the deposit transaction itself already
        // succeeded (§4.8).
        execution.record_step(StepResult::ok(RebalanceStep::Verification, None, None));

        self.finalize_gas_cost(&mut execution, gas_source).await;
        execution.finish();
        execution
    }

    async fn validate(&self, request: &ExecutionRequest) -> Result<ResolvedRoute, String> {
        let rec = &request.recommendation;

        if self.read_only {
            return Err("executor is in read-only mode; refusing to submit transactions".to_string());
        }

        if rec.amount_usd <= Decimal::ZERO {
            return Err(format!("amount_usd must be positive, got {}", rec.amount_usd));
        }

        if rec.to_protocol.is_empty() {
            return Err("destination protocol not set".to_string());
        }

        match self.spending.check(rec.amount_usd) {
            Ok(ApprovalRequirement::RequiresApproval) if !request.human_approved => {
                return Err(format!(
                    "{REQUIRES_APPROVAL_MARKER}: ${} is at or above the approval threshold",
                    rec.amount_usd
                ));
            }
            Ok(_) => {}
            Err(reason) => return Err(reason),
        }

        let to_adapter = self
            .registry
            .get(&rec.to_protocol)
            .ok_or_else(|| format!("no registered adapter for destination protocol {}", rec.to_protocol))?;
        let to_pool_id = resolve_pool(to_adapter.as_ref(), &rec.token).await?;

        let from = match &rec.from_protocol {
            Some(name) => {
                let adapter = self
                    .registry
                    .get(name)
                    .ok_or_else(|| format!("no registered adapter for source protocol {name}"))?;
                let pool_id = resolve_pool(adapter.as_ref(), &rec.token).await?;
                Some((adapter, pool_id))
            }
            None => None,
        };

        Ok(ResolvedRoute {
            to_adapter,
            to_pool_id,
            from,
        })
    }

    async fn balance_check(
        &self,
        route: &ResolvedRoute,
        rec: &RebalanceRecommendation,
        owner_address: &str,
        amount_raw: u128,
        execution: &mut RebalanceExecution,
    ) -> bool {
        let Some((from_adapter, from_pool)) = &route.from else {
            execution.record_step(StepResult::ok(RebalanceStep::BalanceCheck, None, None));
            return true;
        };

        match from_adapter.get_user_balance(from_pool, owner_address).await {
            Ok(balance) if balance >= amount_raw => {
                execution.record_step(StepResult::ok(RebalanceStep::BalanceCheck, None, None));
                true
            }
            Ok(balance) => {
                execution.record_step(StepResult::failed(
                    RebalanceStep::BalanceCheck,
                    format!("on-chain balance {balance} below the {amount_raw} required for this move ({})", rec.token),
                ));
                false
            }
            Err(err) => {
                execution.record_step(StepResult::failed(RebalanceStep::BalanceCheck, err.to_string()));
                false
            }
        }
    }

    async fn amount_to_raw(&self, rec: &RebalanceRecommendation, decimals: u32, price_source: &dyn PriceSource) -> Option<u128> {
        let price = price_source.get_price_usd(&rec.token).await.ok()?;
        if price <= Decimal::ZERO {
            return None;
        }
        to_raw(rec.amount_usd / price, decimals)
    }

    async fn finalize_gas_cost(&self, execution: &mut RebalanceExecution, gas_source: &dyn GasSource) {
        execution.total_gas_cost_usd = gas_source
            .calculate_gas_cost(execution.total_gas_used)
            .await
            .unwrap_or(Decimal::ZERO);

        let gas_price_wei = gas_source.get_gas_price().await.unwrap_or_default();
        execution.total_gas_cost_eth =
            u256_to_decimal(gas_price_wei) * Decimal::from(execution.total_gas_used) / Decimal::from(WEI_PER_ETH);
    }
}

/// Re-queries the adapter's pool list for the highest-APY pool holding
/// `token`, mirroring the Strategy layer's own selection (`best_opportunity_for`)
/// so the Executor never acts on a stale pool reference from an earlier scan.
async fn resolve_pool(adapter: &dyn ProtocolAdapter, token: &str) -> Result<String, String> {
    let pools = adapter
        .get_pools()
        .await
        .map_err(|err| format!("{} pool discovery failed: {err}", adapter.name()))?;

    pools
        .into_iter()
        .filter(|pool| pool.tokens.iter().any(|t| t == token))
        .fold(None::<YieldOpportunity>, |best, candidate| match best {
            Some(ref b) if b.apy >= candidate.apy => Some(b.clone()),
            _ => Some(candidate),
        })
        .map(|pool| pool.pool_id)
        .ok_or_else(|| format!("{} has no pool for token {token}", adapter.name()))
}

fn u256_to_decimal(value: ethers::types::U256) -> Decimal {
    value.to_string().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethers::types::{Bytes, U256};
    use rust_decimal_macros::dec;
    use yieldkeeper_adapters::MockAdapter;
    use yieldkeeper_interfaces::Result as InterfaceResult;

    struct StaticGasSource;

    #[async_trait]
    impl GasSource for StaticGasSource {
        async fn get_gas_price(&self) -> InterfaceResult<U256> {
            Ok(U256::from(20_000_000_000u64))
        }
        async fn estimate_gas(&self, _to: &str, _value: U256, _data: &Bytes) -> InterfaceResult<u64> {
            Ok(21_000)
        }
        async fn calculate_gas_cost(&self, units: u64) -> InterfaceResult<Decimal> {
            Ok(Decimal::from(units) * dec!(0.00000005))
        }
    }

    struct StaticPriceSource;

    #[async_trait]
    impl PriceSource for StaticPriceSource {
        async fn get_price(&self, _symbol: &str, _quote: &str) -> InterfaceResult<Decimal> {
            Ok(dec!(1))
        }
    }

    fn spending_config() -> SpendingLimitsConfig {
        SpendingLimitsConfig {
            max_transaction_value_usd: dec!(50_000),
            daily_spending_limit_usd: dec!(200_000),
            approval_threshold_usd: dec!(25_000),
        }
    }

    fn recommendation(from: Option<&str>, to: &str, amount_usd: Decimal) -> RebalanceRecommendation {
        RebalanceRecommendation {
            from_protocol: from.map(|s| s.to_string()),
            to_protocol: to.to_string(),
            token: "USDC".to_string(),
            amount_usd,
            current_apy: from.map(|_| dec!(3)),
            expected_apy: dec!(9),
            reason: "test".to_string(),
            confidence: 80,
        }
    }

    fn pool(protocol: &str) -> YieldOpportunity {
        YieldOpportunity::new(protocol, "pool-1", "USDC Pool", dec!(9), dec!(50_000_000), vec!["USDC".to_string()])
    }

    #[tokio::test]
    async fn successful_rebalance_runs_every_step_in_order() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(
            MockAdapter::new("aave-v3")
                .with_pool(pool("aave-v3"))
                .with_balance("pool-1", "0xwallet", 10_000_000_000),
        ));
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(Some("aave-v3"), "moonwell", dec!(5000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;

        assert!(execution.success, "{:?}", execution.steps);
        // Validation, BalanceCheck, Withdraw, ApproveDeposit, Deposit, Verification.
        // ApproveSwap/Swap never fire in this core (single-token recommendations only).
        assert_eq!(execution.steps.len(), 6);
        assert!(execution.total_gas_used > 0);
        assert!(execution.total_gas_cost_usd > Decimal::ZERO);
    }

    #[tokio::test]
    async fn new_capital_allocation_skips_withdraw_from_check() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(None, "moonwell", dec!(2000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(execution.success, "{:?}", execution.steps);
        assert!(execution.step_result(RebalanceStep::Withdraw).is_none());
    }

    #[tokio::test]
    async fn insufficient_balance_fails_at_balance_check() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(
            MockAdapter::new("aave-v3")
                .with_pool(pool("aave-v3"))
                .with_balance("pool-1", "0xwallet", 1_000_000),
        ));
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(Some("aave-v3"), "moonwell", dec!(5000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(!execution.success);
        assert_eq!(
            execution.step_result(RebalanceStep::BalanceCheck).unwrap().success,
            false
        );
    }

    #[tokio::test]
    async fn read_only_executor_refuses_to_act() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, true);

        let request = ExecutionRequest {
            recommendation: recommendation(None, "moonwell", dec!(2000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(!execution.success);
        assert_eq!(execution.steps.len(), 1);
    }

    #[tokio::test]
    async fn transaction_above_approval_threshold_without_sign_off_is_refused() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(None, "moonwell", dec!(30_000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(!execution.success);
        let err = execution.step_result(RebalanceStep::Validation).unwrap().error.clone().unwrap();
        assert!(err.starts_with(REQUIRES_APPROVAL_MARKER));
    }

    #[tokio::test]
    async fn transaction_above_approval_threshold_with_sign_off_proceeds() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("moonwell").with_pool(pool("moonwell"))));

        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(None, "moonwell", dec!(30_000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: true,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(execution.success, "{:?}", execution.steps);
    }

    #[tokio::test]
    async fn missing_destination_adapter_fails_validation() {
        let registry = AdapterRegistry::new();
        let spending_cfg = spending_config();
        let executor = RebalanceExecutor::new(&registry, &spending_cfg, false);

        let request = ExecutionRequest {
            recommendation: recommendation(None, "unregistered", dec!(1000)),
            owner_address: "0xwallet".to_string(),
            token_decimals: 6,
            human_approved: false,
        };

        let execution = executor.execute(request, &StaticGasSource, &StaticPriceSource).await;
        assert!(!execution.success);
        assert_eq!(execution.steps.len(), 1);
    }
}
