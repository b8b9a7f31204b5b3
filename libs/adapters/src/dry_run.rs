//! Gas figures and synthetic tx hashes used by every adapter's dry-run path
//! (§4.8): realistic enough that downstream gas accounting behaves the same
//! whether or not a real chain call happened.

use uuid::Uuid;
use yieldkeeper_interfaces::AdapterOp;

pub struct DryRunGas;

impl DryRunGas {
    pub const WITHDRAW: u64 = 150_000;
    pub const DEPOSIT: u64 = 120_000;
    pub const APPROVE: u64 = 50_000;
    pub const SWAP: u64 = 200_000;

    pub fn for_op(op: AdapterOp) -> u64 {
        match op {
            AdapterOp::Withdraw => Self::WITHDRAW,
            AdapterOp::Deposit => Self::DEPOSIT,
            AdapterOp::Approve => Self::APPROVE,
            AdapterOp::Swap => Self::SWAP,
        }
    }
}

/// A hash-shaped placeholder for a transaction that was never submitted.
pub fn synthetic_tx_hash() -> String {
    format!("0xdryrun{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_figures_match_documented_constants() {
        assert_eq!(DryRunGas::for_op(AdapterOp::Withdraw), 150_000);
        assert_eq!(DryRunGas::for_op(AdapterOp::Deposit), 120_000);
        assert_eq!(DryRunGas::for_op(AdapterOp::Approve), 50_000);
        assert_eq!(DryRunGas::for_op(AdapterOp::Swap), 200_000);
    }

    #[test]
    fn synthetic_hash_is_marked_as_dry_run() {
        assert!(synthetic_tx_hash().starts_with("0xdryrun"));
    }
}
