//! Parallel yield discovery across registered protocol adapters (§4.4).

mod analytics;
mod scanner;

pub use analytics::YieldComparison;
pub use scanner::{ScanError, YieldScanner};
