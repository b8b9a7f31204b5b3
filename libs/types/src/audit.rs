use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity of an audit event, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Enumerated event types the engine emits. New event kinds should be added
/// here rather than passed as free-form strings, so the audit trail stays
/// machine-queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    YieldScan,
    RebalanceOpportunityFound,
    RebalanceExecuted,
    TransactionSubmitted,
    RpcUsageSummary,
    RpcEndpointFailure,
    RpcCircuitBreakerOpened,
    SpendingLimitBreach,
    ConfigChanged,
    PositionReconciled,
    SchedulerWatchdogTimeout,
    SchedulerError,
}

/// One append-only, line-delimited-JSON audit record. Metadata must never
/// carry secret material (API keys, seeds, signing keys); RPC-related
/// events carry only the provider name, never a raw endpoint URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub message: String,
    pub metadata: HashMap<String, String>,
    pub user: Option<String>,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        severity: AuditSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            severity,
            message: message.into(),
            metadata: HashMap::new(),
            user: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
