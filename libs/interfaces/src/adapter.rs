use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use yieldkeeper_types::YieldOpportunity;

/// Gas-unit estimates for the four mutating adapter operations, used by the
/// Profitability Calculator and by dry-run synthetic receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOp {
    Withdraw,
    Approve,
    Swap,
    Deposit,
}

/// Uniform read/write surface over one yield source. Every protocol
/// integration (Aave, Moonwell, Morpho, Aerodrome, ...) implements this once
/// and registers under a stable name (§4.3).
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Stable name this adapter is registered under (e.g. "aave-v3").
    fn name(&self) -> &str;

    /// Read-only pool discovery.
    async fn get_pools(&self) -> Result<Vec<YieldOpportunity>>;

    /// Returns a transaction hash. In dry-run mode, returns a synthetic hash
    /// and logs intent without calling the Chain Gateway.
    async fn deposit(&self, pool_id: &str, token: &str, amount_raw: u128) -> Result<String>;

    async fn withdraw(&self, pool_id: &str, token: &str, amount_raw: u128) -> Result<String>;

    async fn get_user_balance(&self, pool_id: &str, address: &str) -> Result<u128>;

    async fn estimate_gas(&self, op: AdapterOp, amount_usd: Decimal) -> Result<u64>;

    /// Whether this adapter is in dry-run mode (synthetic receipts only).
    fn is_dry_run(&self) -> bool {
        false
    }
}
