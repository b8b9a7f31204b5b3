//! Seven-factor risk scoring and the proceed/veto gate built on top of it
//! (§4.6).

mod assessor;

pub use assessor::{RiskAssessor, RiskInputs, SwapNeed};
