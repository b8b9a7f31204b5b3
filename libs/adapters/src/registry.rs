use std::sync::Arc;

use dashmap::DashMap;

use yieldkeeper_interfaces::ProtocolAdapter;

/// Name-keyed adapter registry. Strategy, Scanner, and Executor route
/// mutating/read operations through this instead of holding adapters
/// directly, so the supported-protocol allowlist is enforced in one place.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: DashMap<String, Arc<dyn ProtocolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, adapter: Arc<dyn ProtocolAdapter>) {
        let name = adapter.name().to_string();
        tracing::info!(protocol = %name, "registered protocol adapter");
        self.adapters.insert(name, adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProtocolAdapter>> {
        self.adapters.get(name).map(|entry| entry.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters.iter().map(|e| e.key().clone()).collect()
    }

    pub fn all(&self) -> Vec<Arc<dyn ProtocolAdapter>> {
        self.adapters.iter().map(|e| e.value().clone()).collect()
    }

    /// All registered adapters whose name appears in `allowlist`.
    pub fn supported(&self, allowlist: &[String]) -> Vec<Arc<dyn ProtocolAdapter>> {
        self.adapters
            .iter()
            .filter(|e| allowlist.iter().any(|name| name == e.key()))
            .map(|e| e.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;

    #[test]
    fn register_and_fetch_roundtrip() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("aave-v3")));

        assert!(registry.get("aave-v3").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["aave-v3".to_string()]);
    }

    #[test]
    fn supported_filters_by_allowlist() {
        let registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new("aave-v3")));
        registry.register(Arc::new(MockAdapter::new("unsupported-protocol")));

        let allowed = registry.supported(&["aave-v3".to_string()]);
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].name(), "aave-v3");
    }
}
