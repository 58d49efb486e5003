//! Player persistence behind the [`PlayerStore`] trait.

/// Amazon DynamoDB backend.
#[cfg(feature = "dynamo-store")]
pub mod dynamodb;
/// In-process backend for local runs and tests.
pub mod memory;
/// PostgreSQL backend.
#[cfg(feature = "postgres-store")]
pub mod postgres;

use std::sync::Arc;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    config::StoreConfig,
    dao::{models::PlayerEntity, storage::StorageResult},
    state::player::{Score, Username},
};

pub use memory::MemoryPlayerStore;

/// Abstraction over the persistence layer for player scores.
///
/// Every implementation must perform [`PlayerStore::upsert_player`] as a single
/// atomic operation on the backend: concurrent calls for one username must
/// never produce two records or a mix of two writes.
pub trait PlayerStore: Send + Sync {
    /// Create the player if absent, otherwise replace its score and `updated_at`.
    fn upsert_player(
        &self,
        username: Username,
        score: Score,
        now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// The stored player, `None` when absent.
    fn find_player(&self, username: Username)
    -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Players ordered by score descending, at most `limit` of them.
    fn list_top_players(&self, limit: u32) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Round-trip to the backend without touching player data.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Connect to the backend described by `config`, bootstrapping its table when missing.
pub async fn connect(config: &StoreConfig) -> StorageResult<Arc<dyn PlayerStore>> {
    match config {
        #[cfg(feature = "dynamo-store")]
        StoreConfig::Dynamo(dynamo) => {
            let store = dynamodb::DynamoPlayerStore::connect(dynamo.clone()).await?;
            info!(table = %dynamo.table_name, "connected to DynamoDB");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres-store")]
        StoreConfig::Postgres(postgres) => {
            let store = postgres::PostgresPlayerStore::connect(postgres.clone()).await?;
            info!(
                max_connections = postgres.max_connections,
                "connected to PostgreSQL"
            );
            Ok(Arc::new(store))
        }
        StoreConfig::Memory => {
            info!("using in-memory player store; data is lost on restart");
            Ok(Arc::new(MemoryPlayerStore::new()))
        }
    }
}
