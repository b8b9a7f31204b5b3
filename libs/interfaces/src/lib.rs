//! External collaborator contracts.
//!
//! The optimization engine never talks to a chain, a price feed, gas
//! station, or persistence layer directly — it depends on these traits.
//! Production wiring (outside this core) supplies concrete implementations;
//! `yieldkeeper-adapters` and `yieldkeeper-audit` ship reference/in-memory
//! ones used by tests and dry-run mode.

pub mod adapter;
pub mod audit_sink;
pub mod chain_gateway;
pub mod error;
pub mod gas_source;
pub mod position_store;
pub mod price_source;

pub use adapter::{AdapterOp, ProtocolAdapter};
pub use audit_sink::AuditSink;
pub use chain_gateway::{ChainGateway, Receipt};
pub use error::{InterfaceError, Result};
pub use gas_source::GasSource;
pub use position_store::PositionStore;
pub use price_source::PriceSource;
