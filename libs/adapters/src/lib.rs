//! Protocol adapter registry and the dry-run gas constants shared by every
//! adapter implementation (§4.3, §4.8).

mod registry;
mod dry_run;
mod mock;

pub use dry_run::{synthetic_tx_hash, DryRunGas};
pub use mock::MockAdapter;
pub use registry::AdapterRegistry;
