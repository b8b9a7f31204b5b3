use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recorded scheduler-cycle error, kept for operator visibility (last N
/// only — callers decide the retention window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerError {
    pub timestamp: DateTime<Utc>,
    pub error_type: String,
    pub message: String,
}

/// Rolling counters and lifecycle state for the Scheduled Optimizer. This is
/// read by external status/health callers while the cycle task mutates it;
/// production wiring guards the whole struct with a single mutex so readers
/// always see a coherent snapshot (see `services/optimizer`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub next_scan_time: Option<DateTime<Utc>>,
    pub total_scans: u64,
    pub total_rebalances: u64,
    pub opportunities_found: u64,
    pub opportunities_executed: u64,
    pub opportunities_skipped: u64,
    pub total_gas_spent_usd: Decimal,
    pub errors: Vec<SchedulerError>,
}

impl Default for SchedulerStatus {
    fn default() -> Self {
        Self {
            running: false,
            start_time: None,
            last_scan_time: None,
            next_scan_time: None,
            total_scans: 0,
            total_rebalances: 0,
            opportunities_found: 0,
            opportunities_executed: 0,
            opportunities_skipped: 0,
            total_gas_spent_usd: Decimal::ZERO,
            errors: Vec::new(),
        }
    }
}

impl SchedulerStatus {
    const MAX_RECENT_ERRORS: usize = 10;

    pub fn push_error(&mut self, error_type: impl Into<String>, message: impl Into<String>) {
        self.errors.push(SchedulerError {
            timestamp: Utc::now(),
            error_type: error_type.into(),
            message: message.into(),
        });
        if self.errors.len() > Self::MAX_RECENT_ERRORS {
            let excess = self.errors.len() - Self::MAX_RECENT_ERRORS;
            self.errors.drain(0..excess);
        }
    }

    /// Daily counters reset when wall-clock crosses 24h since `start_time`.
    pub fn should_reset_daily(&self, now: DateTime<Utc>) -> bool {
        match self.start_time {
            Some(start) => now.signed_duration_since(start) >= chrono::Duration::hours(24),
            None => false,
        }
    }

    pub fn reset_daily_counters(&mut self, now: DateTime<Utc>) {
        self.total_rebalances = 0;
        self.opportunities_found = 0;
        self.opportunities_executed = 0;
        self.opportunities_skipped = 0;
        self.total_gas_spent_usd = Decimal::ZERO;
        self.start_time = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_errors_are_capped() {
        let mut status = SchedulerStatus::default();
        for i in 0..15 {
            status.push_error("e", format!("error {i}"));
        }
        assert_eq!(status.errors.len(), SchedulerStatus::MAX_RECENT_ERRORS);
        assert_eq!(status.errors.last().unwrap().message, "error 14");
    }

    #[test]
    fn daily_reset_boundary() {
        let mut status = SchedulerStatus::default();
        let start = Utc::now();
        status.start_time = Some(start);
        assert!(!status.should_reset_daily(start + chrono::Duration::hours(23)));
        assert!(status.should_reset_daily(start + chrono::Duration::hours(24)));
    }
}
