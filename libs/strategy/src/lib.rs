//! Strategy layer (§4.7): maps current positions and scanned opportunities
//! onto candidate [`RebalanceRecommendation`]s, behind one `Strategy`
//! contract with two implementations — `SimpleYieldStrategy` (aggressive,
//! chases the single best APY) and `RiskAdjustedStrategy` (conservative,
//! screens through the Risk Assessor and diversifies new capital).
//!
//! Callers are expected to have already narrowed `opportunities` to the
//! supported-protocol allowlist (`AdapterRegistry::supported`) — this crate
//! has no opinion on which protocols are whitelisted.

mod risk_adjusted;
mod simple;
mod traits;

pub use risk_adjusted::RiskAdjustedStrategy;
pub use simple::SimpleYieldStrategy;
pub use traits::{confidence_score, should_rebalance, Strategy};
