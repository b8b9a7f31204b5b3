use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A capital position the engine is responsible for. Created when a deposit
/// completes (or is first detected on-chain), mutated only by reconciliation
/// after a completed execution, and logically closed once `amount_raw` hits
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub protocol: String,
    pub pool_id: String,
    pub token: String,
    pub amount_raw: u128,
    pub decimals: u32,
    pub value_usd: Decimal,
    pub current_apy: Decimal,
}

impl Position {
    pub fn is_closed(&self) -> bool {
        self.amount_raw == 0
    }

    pub fn display_amount(&self) -> Decimal {
        crate::decimal_ext::format_raw(self.amount_raw, self.decimals)
    }
}
