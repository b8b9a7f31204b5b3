//! Shared data model for the autonomous yield optimizer.
//!
//! Every named record here corresponds 1:1 to an entity in the engine's data
//! model: yield snapshots, positions, rebalance recommendations, cost and
//! profitability breakdowns, risk assessments, execution traces, RPC endpoint
//! state, and scheduler status. Nothing in this crate talks to a chain, a
//! database, or the network — see `yieldkeeper-interfaces` for the trait
//! boundaries that do.

pub mod audit;
pub mod decimal_ext;
pub mod execution;
pub mod opportunity;
pub mod position;
pub mod profitability;
pub mod recommendation;
pub mod risk;
pub mod rpc;
pub mod scheduler;

pub use audit::{AuditEvent, AuditEventType, AuditSeverity};
pub use decimal_ext::{format_raw, to_raw};
pub use execution::{RebalanceExecution, RebalanceStep, StepResult};
pub use opportunity::YieldOpportunity;
pub use position::Position;
pub use profitability::{BreakEvenDays, MoveProfitability, RebalancingCosts};
pub use recommendation::RebalanceRecommendation;
pub use risk::{RiskAssessment, RiskLevel};
pub use rpc::{CircuitState, EndpointPriority, RpcEndpoint};
pub use scheduler::{SchedulerError, SchedulerStatus};
