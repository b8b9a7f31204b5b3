use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;

/// Token/fiat price oracle. Implementations own caching and staleness
/// policy; this trait only guarantees a positive decimal or an error —
/// never a silent zero.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_price(&self, symbol: &str, quote: &str) -> Result<Decimal>;

    async fn get_price_usd(&self, symbol: &str) -> Result<Decimal> {
        self.get_price(symbol, "USD").await
    }
}
