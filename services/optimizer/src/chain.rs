//! Chain Gateway and Gas Source stand-ins (§6). Real signing, nonce
//! management, and live gas-market data are explicitly out of scope (§1) —
//! but the RPC Dispatcher's endpoint selection, rate limiting, and circuit
//! breaking are core, in-scope machinery (§4.1), so these stand-ins still
//! route every call through a shared [`RpcDispatcher`] against a single
//! registered dry-run endpoint rather than bypassing it. A production
//! deployment swaps the closures below for a real JSON-RPC client; the
//! dispatch path around them does not change.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Bytes, H256, U256};
use rust_decimal::Decimal;

use yieldkeeper_interfaces::{ChainGateway, GasSource, InterfaceError, Receipt, Result};
use yieldkeeper_rpc::RpcDispatcher;

const WEI_PER_GWEI: u64 = 1_000_000_000;
const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

fn gwei_to_wei(gas_price_gwei: Decimal) -> U256 {
    let wei = (gas_price_gwei * Decimal::from(WEI_PER_GWEI)).trunc();
    U256::from_dec_str(&wei.to_string()).unwrap_or_default()
}

/// `ChainGateway` consumed by nothing in this core today (no component
/// drives a transaction through signing/submission directly — that is the
/// Protocol Adapter's job, and adapters here are dry-run `MockAdapter`s).
/// Wired up anyway so the Dispatcher's endpoint-registration and failover
/// path is exercised end to end rather than left untested scaffolding.
pub struct DryRunChainGateway {
    dispatcher: Arc<RpcDispatcher>,
    network: String,
    chain_id: u64,
    gas_price_gwei: Decimal,
}

impl DryRunChainGateway {
    pub fn new(
        dispatcher: Arc<RpcDispatcher>,
        network: impl Into<String>,
        chain_id: u64,
        gas_price_gwei: Decimal,
    ) -> Self {
        Self {
            dispatcher,
            network: network.into(),
            chain_id,
            gas_price_gwei,
        }
    }
}

#[async_trait]
impl ChainGateway for DryRunChainGateway {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64> {
        self.dispatcher
            .execute(&self.network, "block_number", |_handle| async move { Ok(0u64) })
            .await
            .map_err(|err| InterfaceError::Chain(err.to_string()))
    }

    async fn gas_price(&self) -> Result<U256> {
        let price = gwei_to_wei(self.gas_price_gwei);
        self.dispatcher
            .execute(&self.network, "gas_price", move |_handle| {
                let price = price;
                async move { Ok(price) }
            })
            .await
            .map_err(|err| InterfaceError::Chain(err.to_string()))
    }

    async fn call(&self, to: &str, _data: Bytes) -> Result<Bytes> {
        Err(InterfaceError::Chain(format!(
            "dry-run gateway has no contract state to read at {to}"
        )))
    }

    async fn send(&self, _signed_tx: Bytes) -> Result<H256> {
        Err(InterfaceError::Chain(
            "dry-run gateway never submits signed transactions".to_string(),
        ))
    }

    async fn wait_receipt(&self, _hash: H256) -> Result<Receipt> {
        Ok(Receipt {
            status: true,
            gas_used: 0,
            block_number: 0,
        })
    }

    async fn estimate_gas(&self, _to: &str, _data: &Bytes) -> Result<u64> {
        Ok(21_000)
    }
}

/// `GasSource` (§6): flat configured gas price and ETH/USD conversion,
/// routed through the same `RpcDispatcher` as [`DryRunChainGateway`].
pub struct DryRunGasSource {
    dispatcher: Arc<RpcDispatcher>,
    network: String,
    gas_price_gwei: Decimal,
    eth_usd_price: Decimal,
}

impl DryRunGasSource {
    pub fn new(
        dispatcher: Arc<RpcDispatcher>,
        network: impl Into<String>,
        gas_price_gwei: Decimal,
        eth_usd_price: Decimal,
    ) -> Self {
        Self {
            dispatcher,
            network: network.into(),
            gas_price_gwei,
            eth_usd_price,
        }
    }
}

#[async_trait]
impl GasSource for DryRunGasSource {
    async fn get_gas_price(&self) -> Result<U256> {
        let price = gwei_to_wei(self.gas_price_gwei);
        self.dispatcher
            .execute(&self.network, "get_gas_price", move |_handle| {
                let price = price;
                async move { Ok(price) }
            })
            .await
            .map_err(|err| InterfaceError::Gas(err.to_string()))
    }

    async fn estimate_gas(&self, _to: &str, _value: U256, _data: &Bytes) -> Result<u64> {
        Ok(21_000)
    }

    async fn calculate_gas_cost(&self, units: u64) -> Result<Decimal> {
        let gas_price_wei = Decimal::from(WEI_PER_GWEI) * self.gas_price_gwei;
        let eth_cost = gas_price_wei * Decimal::from(units) / Decimal::from(WEI_PER_ETH);
        Ok(eth_cost * self.eth_usd_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::time::Duration;
    use yieldkeeper_types::{EndpointPriority, RpcEndpoint};

    fn dispatcher_with_local_endpoint(network: &str) -> Arc<RpcDispatcher> {
        let dispatcher = Arc::new(RpcDispatcher::new(false, 100, 3, Duration::from_secs(60), HashMap::new()));
        dispatcher.add_endpoint(
            network,
            RpcEndpoint::new("local://dry-run", EndpointPriority::Public, "dry-run", network, u32::MAX, u32::MAX),
        );
        dispatcher
    }

    #[tokio::test]
    async fn gas_source_reports_flat_configured_price() {
        let dispatcher = dispatcher_with_local_endpoint("base-mainnet");
        let gas_source = DryRunGasSource::new(dispatcher, "base-mainnet", dec!(20), dec!(3000));

        let price = gas_source.get_gas_price().await.unwrap();
        assert_eq!(price, U256::from(20_000_000_000u64));
    }

    #[tokio::test]
    async fn gas_cost_converts_units_through_eth_to_usd() {
        let dispatcher = dispatcher_with_local_endpoint("base-mainnet");
        let gas_source = DryRunGasSource::new(dispatcher, "base-mainnet", dec!(20), dec!(3000));

        let cost = gas_source.calculate_gas_cost(21_000).await.unwrap();
        assert!(cost > Decimal::ZERO);
    }

    #[tokio::test]
    async fn chain_gateway_reports_configured_chain_id() {
        let dispatcher = dispatcher_with_local_endpoint("base-mainnet");
        let gateway = DryRunChainGateway::new(dispatcher, "base-mainnet", 8453, dec!(20));
        assert_eq!(gateway.chain_id().await.unwrap(), 8453);
    }
}
