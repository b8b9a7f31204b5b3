use async_trait::async_trait;

use yieldkeeper_types::AuditEvent;

/// Append-only structured event trail. Must never raise on back-pressure —
/// drop-or-buffer under load is the implementation's choice, not the
/// caller's problem.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_event(&self, event: AuditEvent);
}
