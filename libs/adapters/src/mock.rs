use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;

use yieldkeeper_interfaces::{AdapterOp, InterfaceError, ProtocolAdapter, Result};
use yieldkeeper_types::YieldOpportunity;

use crate::dry_run::{synthetic_tx_hash, DryRunGas};

/// In-memory stand-in adapter for tests and for a freshly-wired binary
/// before real protocol integrations exist. Always dry-run: deposits and
/// withdrawals only move numbers in an in-process balance table.
pub struct MockAdapter {
    name: String,
    pools: Vec<YieldOpportunity>,
    balances: DashMap<(String, String, String), u128>,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pools: Vec::new(),
            balances: DashMap::new(),
        }
    }

    pub fn with_pool(mut self, pool: YieldOpportunity) -> Self {
        self.pools.push(pool);
        self
    }

    pub fn with_balance(self, pool_id: &str, address: &str, amount_raw: u128) -> Self {
        self.balances.insert(
            (pool_id.to_string(), address.to_string(), self.name.clone()),
            amount_raw,
        );
        self
    }
}

#[async_trait]
impl ProtocolAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_pools(&self) -> Result<Vec<YieldOpportunity>> {
        Ok(self.pools.clone())
    }

    async fn deposit(&self, pool_id: &str, token: &str, amount_raw: u128) -> Result<String> {
        let key = (pool_id.to_string(), token.to_string(), self.name.clone());
        *self.balances.entry(key).or_insert(0) += amount_raw;
        Ok(synthetic_tx_hash())
    }

    async fn withdraw(&self, pool_id: &str, token: &str, amount_raw: u128) -> Result<String> {
        let key = (pool_id.to_string(), token.to_string(), self.name.clone());
        let mut balance = self.balances.entry(key).or_insert(0);
        if *balance < amount_raw {
            return Err(InterfaceError::Adapter {
                protocol: self.name.clone(),
                reason: "insufficient balance".to_string(),
            });
        }
        *balance -= amount_raw;
        Ok(synthetic_tx_hash())
    }

    async fn get_user_balance(&self, pool_id: &str, address: &str) -> Result<u128> {
        let key = (pool_id.to_string(), address.to_string(), self.name.clone());
        Ok(self.balances.get(&key).map(|v| *v).unwrap_or(0))
    }

    async fn estimate_gas(&self, op: AdapterOp, _amount_usd: Decimal) -> Result<u64> {
        Ok(DryRunGas::for_op(op))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn deposit_then_withdraw_tracks_balance() {
        let adapter = MockAdapter::new("aave-v3");
        adapter.deposit("pool-1", "USDC", 1_000_000).await.unwrap();

        let balance = adapter.get_user_balance("pool-1", "USDC").await.unwrap();
        assert_eq!(balance, 1_000_000);

        adapter.withdraw("pool-1", "USDC", 400_000).await.unwrap();
        let balance = adapter.get_user_balance("pool-1", "USDC").await.unwrap();
        assert_eq!(balance, 600_000);
    }

    #[tokio::test]
    async fn withdraw_beyond_balance_fails() {
        let adapter = MockAdapter::new("aave-v3");
        let result = adapter.withdraw("pool-1", "USDC", 1).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn estimate_gas_matches_dry_run_constants() {
        let adapter = MockAdapter::new("aave-v3");
        let gas = adapter
            .estimate_gas(AdapterOp::Deposit, dec!(1000))
            .await
            .unwrap();
        assert_eq!(gas, DryRunGas::DEPOSIT);
    }
}
