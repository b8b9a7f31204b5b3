//! Position Store stand-in (§6). No durable position ledger is in scope
//! here, so this keeps the open book in memory for the lifetime of the
//! process — matching the in-memory-table idiom `yieldkeeper-adapters`'s
//! `MockAdapter` uses for its own pools/balances tables.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use yieldkeeper_interfaces::{InterfaceError, PositionStore, Result};
use yieldkeeper_types::Position;

type PositionKey = (String, String, String);

fn key_for(protocol: &str, pool_id: &str, token: &str) -> PositionKey {
    (protocol.to_string(), pool_id.to_string(), token.to_string())
}

/// Holds the set of open positions this process believes exist. Seeded at
/// startup from whatever a deployment's real ledger reports; updated only
/// by the Executor's own `upsert_position`/`close_position` calls as moves
/// complete, never mutated directly by the scan or strategy stages.
#[derive(Default)]
pub struct InMemoryPositionStore {
    positions: RwLock<HashMap<PositionKey, Position>>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(initial: Vec<Position>) -> Self {
        let store = Self::new();
        for position in initial {
            let key = key_for(&position.protocol, &position.pool_id, &position.token);
            store.positions.write().insert(key, position);
        }
        store
    }
}

#[async_trait]
impl PositionStore for InMemoryPositionStore {
    async fn get_current_positions(&self) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .values()
            .filter(|position| !position.is_closed())
            .cloned()
            .collect())
    }

    async fn upsert_position(&self, position: Position) -> Result<()> {
        let key = key_for(&position.protocol, &position.pool_id, &position.token);
        self.positions.write().insert(key, position);
        Ok(())
    }

    async fn close_position(&self, protocol: &str, pool_id: &str, token: &str) -> Result<()> {
        let key = key_for(protocol, pool_id, token);
        self.positions.write().remove(&key).ok_or_else(|| {
            InterfaceError::Store(format!("no open position for {protocol}/{pool_id}/{token}"))
        })?;
        Ok(())
    }
}
