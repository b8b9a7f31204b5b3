use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An immutable snapshot of a yield-bearing pool discovered by a protocol
/// adapter. APY and TVL may legitimately be zero when a source can't
/// determine them yet — consumers must treat zero as "unknown", not "none".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldOpportunity {
    pub protocol: String,
    pub pool_id: String,
    pub pool_name: String,
    pub apy: Decimal,
    pub tvl_usd: Decimal,
    pub tokens: Vec<String>,
    pub metadata: HashMap<String, String>,
}

impl YieldOpportunity {
    pub fn new(
        protocol: impl Into<String>,
        pool_id: impl Into<String>,
        pool_name: impl Into<String>,
        apy: Decimal,
        tvl_usd: Decimal,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            pool_id: pool_id.into(),
            pool_name: pool_name.into(),
            apy,
            tvl_usd,
            tokens,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
