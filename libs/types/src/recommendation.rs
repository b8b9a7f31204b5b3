use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single-use instruction produced by a `Strategy` and consumed exactly
/// once by the Rebalance Executor. Never mutated after creation; a retry
/// requires the strategy to produce a fresh recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRecommendation {
    /// `None` for new-capital allocation (no source position to withdraw from).
    pub from_protocol: Option<String>,
    pub to_protocol: String,
    pub token: String,
    pub amount_usd: Decimal,
    pub current_apy: Option<Decimal>,
    pub expected_apy: Decimal,
    pub reason: String,
    /// 0..=100
    pub confidence: u8,
}

impl RebalanceRecommendation {
    pub fn is_new_capital(&self) -> bool {
        self.from_protocol.is_none()
    }

    /// Whether this recommendation's source and destination tokens could
    /// differ, i.e. whether a swap step would be required. The minimal core
    /// only supports same-token rebalancing (see executor docs); this is a
    /// structural placeholder for that documented extension point.
    pub fn requires_swap(&self, from_token: Option<&str>) -> bool {
        match from_token {
            Some(t) => t != self.token,
            None => false,
        }
    }
}
