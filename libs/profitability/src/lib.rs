//! Four-gate profitability calculator (§4.5): a hard financial gate applied
//! to every rebalance candidate before Strategy or Executor may act on it.

mod calculator;

pub use calculator::{ProfitabilityCalculator, ProfitabilityInputs};
