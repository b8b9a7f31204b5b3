//! Errors the per-cycle pipeline can propagate up to the scheduler's
//! generic error policy: caught, logged, appended to `errors`,
//! audit-recorded, then a 300s cooldown before the next cycle.

use thiserror::Error;

use yieldkeeper_interfaces::InterfaceError;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("position store: {0}")]
    PositionStore(#[from] InterfaceError),
}
