use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use yieldkeeper_config::SpendingLimitsConfig;

/// Prefix an audit consumer can match on to classify a failed Validation
/// step as a spending-limit breach rather than an ordinary refusal.
pub const SPENDING_LIMIT_BREACH_MARKER: &str = "spending limit breach";

/// Prefix for a Validation failure caused by a transaction sitting at or
/// above `approval_threshold_usd` without `ExecutionRequest::human_approved`.
pub const REQUIRES_APPROVAL_MARKER: &str = "requires human approval";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalRequirement {
    None,
    RequiresApproval,
}

struct SpendingState {
    daily_spent_usd: Decimal,
    window_start: DateTime<Utc>,
}

/// Tracks the notional USD value of capital moved in a rolling 24h window
/// against the hard ceilings in [`SpendingLimitsConfig`]. Independent of the
/// Scheduler's own daily gas-cost cap, which tracks transaction fees rather
/// than principal at risk.
pub struct SpendingLimits<'a> {
    config: &'a SpendingLimitsConfig,
    state: RwLock<SpendingState>,
}

impl<'a> SpendingLimits<'a> {
    pub fn new(config: &'a SpendingLimitsConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SpendingState {
                daily_spent_usd: Decimal::ZERO,
                window_start: Utc::now(),
            }),
        }
    }

    /// Checks `amount_usd` against both ceilings and reports whether it
    /// clears `approval_threshold_usd`. Does not itself record the spend —
    /// call [`Self::record_spend`] once the move is committed to.
    pub fn check(&self, amount_usd: Decimal) -> Result<ApprovalRequirement, String> {
        if amount_usd > self.config.max_transaction_value_usd {
            return Err(format!(
                "{SPENDING_LIMIT_BREACH_MARKER}: ${amount_usd} exceeds max transaction value ${}",
                self.config.max_transaction_value_usd
            ));
        }

        let mut state = self.state.write();
        self.roll_window_if_stale(&mut state);

        let projected = state.daily_spent_usd + amount_usd;
        if projected > self.config.daily_spending_limit_usd {
            return Err(format!(
                "{SPENDING_LIMIT_BREACH_MARKER}: ${amount_usd} would bring the daily total to ${projected}, over the ${} limit",
                self.config.daily_spending_limit_usd
            ));
        }

        if amount_usd >= self.config.approval_threshold_usd {
            Ok(ApprovalRequirement::RequiresApproval)
        } else {
            Ok(ApprovalRequirement::None)
        }
    }

    pub fn record_spend(&self, amount_usd: Decimal) {
        let mut state = self.state.write();
        self.roll_window_if_stale(&mut state);
        state.daily_spent_usd += amount_usd;
    }

    pub fn daily_spent_usd(&self) -> Decimal {
        let mut state = self.state.write();
        self.roll_window_if_stale(&mut state);
        state.daily_spent_usd
    }

    fn roll_window_if_stale(&self, state: &mut SpendingState) {
        if Utc::now() - state.window_start >= Duration::hours(24) {
            state.daily_spent_usd = Decimal::ZERO;
            state.window_start = Utc::now();
        }
    }
}
