use async_trait::async_trait;
use ethers::types::{Bytes, U256};
use rust_decimal::Decimal;

use crate::error::Result;

/// Gas pricing and cost estimation, kept separate from `ChainGateway`
/// because gas estimates are frequently cached/smoothed while chain reads
/// are not.
#[async_trait]
pub trait GasSource: Send + Sync {
    async fn get_gas_price(&self) -> Result<U256>;

    async fn estimate_gas(&self, to: &str, value: U256, data: &Bytes) -> Result<u64>;

    /// Convert a gas-unit amount into its USD cost at current price.
    async fn calculate_gas_cost(&self, units: u64) -> Result<Decimal>;
}
