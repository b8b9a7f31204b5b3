//! Price Source stand-in (§6). A production deployment wires an oracle
//! feed in here; this binary has none in scope, so it serves the flat
//! per-token prices from the wiring config instead of guessing.

use async_trait::async_trait;
use rust_decimal::Decimal;

use yieldkeeper_interfaces::{InterfaceError, PriceSource, Result};

pub struct StaticPriceSource {
    prices: std::collections::HashMap<String, Decimal>,
    default_price: Option<Decimal>,
}

impl StaticPriceSource {
    pub fn new(prices: std::collections::HashMap<String, Decimal>, default_price: Option<Decimal>) -> Self {
        Self { prices, default_price }
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn get_price(&self, symbol: &str, quote: &str) -> Result<Decimal> {
        if quote != "USD" {
            return Err(InterfaceError::Price {
                symbol: symbol.to_string(),
                reason: format!("no quote currency other than USD is configured, got {quote}"),
            });
        }

        self.prices
            .get(symbol)
            .copied()
            .or(self.default_price)
            .filter(|price| *price > Decimal::ZERO)
            .ok_or_else(|| InterfaceError::Price {
                symbol: symbol.to_string(),
                reason: "no static price configured for this token".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn returns_configured_price() {
        let mut prices = std::collections::HashMap::new();
        prices.insert("USDC".to_string(), dec!(1));
        let source = StaticPriceSource::new(prices, None);

        assert_eq!(source.get_price_usd("USDC").await.unwrap(), dec!(1));
    }

    #[tokio::test]
    async fn falls_back_to_default_price() {
        let source = StaticPriceSource::new(std::collections::HashMap::new(), Some(dec!(2500)));
        assert_eq!(source.get_price_usd("WETH").await.unwrap(), dec!(2500));
    }

    #[tokio::test]
    async fn errors_on_unknown_token_with_no_default() {
        let source = StaticPriceSource::new(std::collections::HashMap::new(), None);
        assert!(source.get_price_usd("UNKNOWN").await.is_err());
    }
}
