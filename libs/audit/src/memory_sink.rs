use async_trait::async_trait;
use parking_lot::RwLock;

use yieldkeeper_interfaces::AuditSink;
use yieldkeeper_types::AuditEvent;

/// In-process audit sink for tests and for a freshly-wired binary before a
/// durable sink is configured. Unbounded — callers that need back-pressure
/// should wrap this, not rely on it.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn log_event(&self, event: AuditEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yieldkeeper_types::{AuditEventType, AuditSeverity};

    #[tokio::test]
    async fn records_events_in_order() {
        let sink = InMemoryAuditSink::new();
        sink.log_event(AuditEvent::new(AuditEventType::YieldScan, AuditSeverity::Info, "one"))
            .await;
        sink.log_event(AuditEvent::new(AuditEventType::RebalanceExecuted, AuditSeverity::Info, "two"))
            .await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "one");
        assert_eq!(events[1].message, "two");
    }
}
