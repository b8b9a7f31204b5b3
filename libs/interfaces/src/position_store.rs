use async_trait::async_trait;

use crate::error::Result;
use yieldkeeper_types::Position;

/// Persistence for Positions. Schema and storage medium are the
/// implementation's concern; the core only ever sees this trait.
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn get_current_positions(&self) -> Result<Vec<Position>>;

    async fn upsert_position(&self, position: Position) -> Result<()>;

    async fn close_position(&self, protocol: &str, pool_id: &str, token: &str) -> Result<()>;
}
