//! Rebalance Executor (§4.8): runs a `RebalanceRecommendation` through the
//! canonical eight-step pipeline declared by [`yieldkeeper_types::RebalanceStep`],
//! stopping at the first failed step and always leaving behind a full
//! [`RebalanceExecution`](yieldkeeper_types::RebalanceExecution) trail for audit.

mod executor;
mod spending;

pub use executor::{ExecutionRequest, RebalanceExecutor};
pub use spending::{ApprovalRequirement, SpendingLimits, REQUIRES_APPROVAL_MARKER, SPENDING_LIMIT_BREACH_MARKER};
