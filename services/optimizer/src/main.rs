//! Scheduled Optimizer binary: periodic control loop over
//! Scanner -> Strategy -> Profitability -> Executor (§4.9). No real protocol
//! integrations exist in this tree yet, so every protocol in
//! `supported_protocols` is backed by a dry-run `MockAdapter` — swapping
//! those for live adapters is the only thing standing between this binary
//! and a production deployment.

mod chain;
mod engine;
mod error;
mod positions;
mod price;
mod wiring;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rust_decimal::Decimal;

use yieldkeeper_adapters::{AdapterRegistry, MockAdapter};
use yieldkeeper_audit::JsonLinesAuditSink;
use yieldkeeper_config::{Config, Network, RiskTolerance};
use yieldkeeper_executor::RebalanceExecutor;
use yieldkeeper_rpc::RpcDispatcher;
use yieldkeeper_scanner::YieldScanner;
use yieldkeeper_strategy::{RiskAdjustedStrategy, SimpleYieldStrategy, Strategy};

use chain::DryRunGasSource;
use engine::SchedulerEngine;
use positions::InMemoryPositionStore;
use price::StaticPriceSource;
use wiring::EngineConfig;

fn network_key(network: Network) -> &'static str {
    match network {
        Network::BaseMainnet => "base-mainnet",
        Network::BaseSepolia => "base-sepolia",
        Network::EthereumMainnet => "ethereum-mainnet",
        Network::PolygonMainnet => "polygon-mainnet",
    }
}

fn config_path(prefix: &str, suffix: &str) -> Option<std::path::PathBuf> {
    std::env::var(format!("{prefix}_CONFIG_PATH"))
        .ok()
        .map(std::path::PathBuf::from)
        .or_else(|| {
            let default = std::path::PathBuf::from(format!("./{suffix}"));
            default.exists().then_some(default)
        })
}

/// Builds a dry-run `MockAdapter` per supported protocol, each offering one
/// synthetic pool at a distinct APY so the Strategy layer has something to
/// compare. Real deployments replace this with a registry populated from
/// actual protocol integrations.
fn seed_adapters(registry: &AdapterRegistry, supported_protocols: &[String]) {
    for (index, protocol) in supported_protocols.iter().enumerate() {
        let apy = Decimal::from(3 + index * 2);
        let pool = yieldkeeper_types::YieldOpportunity::new(
            protocol.clone(),
            format!("{protocol}-pool-1"),
            format!("{protocol} USDC Pool"),
            apy,
            Decimal::from(10_000_000),
            vec!["USDC".to_string()],
        );
        registry.register(Arc::new(MockAdapter::new(protocol.clone()).with_pool(pool)));
    }
}

fn build_dispatcher(config: &Config) -> RpcDispatcher {
    let free_tier_quotas: HashMap<String, u64> = config
        .rpc
        .providers
        .iter()
        .filter_map(|provider| provider.free_tier_quota.map(|quota| (provider.name.clone(), quota)))
        .collect();

    let dispatcher = RpcDispatcher::new(
        config.rpc.premium_enabled,
        config.rpc.premium_percentage,
        config.rpc.failure_threshold,
        Duration::from_secs(config.rpc.recovery_timeout_secs),
        free_tier_quotas,
    );

    let network = network_key(config.network);
    for provider in &config.rpc.providers {
        dispatcher.add_endpoint(
            network,
            yieldkeeper_types::RpcEndpoint::new(
                provider.url.clone(),
                provider.priority,
                provider.name.clone(),
                network,
                provider.rate_limit_per_second,
                provider.rate_limit_per_minute,
            ),
        );
    }
    dispatcher
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load(config_path("YIELDKEEPER", "config.toml").as_deref())
        .context("failed to load core configuration")?;
    let engine_config = EngineConfig::load(config_path("ENGINE", "engine.toml").as_deref())
        .context("failed to load engine wiring configuration")?;

    tracing::info!(network = ?config.network, dry_run = config.dry_run_mode, "scheduled optimizer starting");

    let registry = AdapterRegistry::new();
    seed_adapters(&registry, &config.supported_protocols);

    let supported = registry.supported(&config.supported_protocols);
    let scanner = YieldScanner::new(supported);

    let strategy: Box<dyn Strategy> = match config.strategy.risk_tolerance {
        RiskTolerance::Low | RiskTolerance::Medium => {
            Box::new(RiskAdjustedStrategy::new(&config.strategy, &config.profitability, &config.risk))
        }
        RiskTolerance::High => Box::new(SimpleYieldStrategy::new(&config.strategy, &config.profitability)),
    };

    let executor = RebalanceExecutor::new(&registry, &config.spending_limits, config.read_only);

    let dispatcher = Arc::new(build_dispatcher(&config));
    let network = network_key(config.network);
    let gas_source = DryRunGasSource::new(
        dispatcher,
        network,
        engine_config.gas_price_gwei,
        engine_config.eth_usd_price,
    );
    let price_source = StaticPriceSource::new(engine_config.static_prices_usd.clone(), engine_config.default_price_usd);
    let position_store = InMemoryPositionStore::new();
    let audit = JsonLinesAuditSink::new(engine_config.audit_log_path.clone());

    let scheduler = SchedulerEngine::new(
        &config,
        &engine_config,
        &scanner,
        strategy.as_ref(),
        executor,
        &gas_source,
        &price_source,
        &position_store,
        &audit,
    );

    let run_future = scheduler.run();
    futures::pin_mut!(run_future);

    tokio::select! {
        _ = &mut run_future => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("shutdown signal received, stopping scheduled optimizer");
            scheduler.request_stop();
            run_future.await;
        }
    }

    Ok(())
}
