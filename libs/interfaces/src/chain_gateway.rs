use async_trait::async_trait;
use ethers::types::{Bytes, H256, U256};

use crate::error::Result;

/// Receipt of a confirmed (or reverted) on-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub status: bool,
    pub gas_used: u64,
    pub block_number: u64,
}

/// Minimal surface the core requires from a chain-client abstraction.
/// Signing, nonce management, and receipt polling live behind this trait;
/// the core never touches a private key.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
    async fn block_number(&self) -> Result<u64>;
    async fn gas_price(&self) -> Result<U256>;

    /// Read-only contract call.
    async fn call(&self, to: &str, data: Bytes) -> Result<Bytes>;

    /// Submit a pre-signed transaction, returning its hash.
    async fn send(&self, signed_tx: Bytes) -> Result<H256>;

    async fn wait_receipt(&self, hash: H256) -> Result<Receipt>;

    async fn estimate_gas(&self, to: &str, data: &Bytes) -> Result<u64>;
}
