pub mod memory;
pub mod signal_repo;
pub mod stub;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::models::{RowKey, RowKeyFilter, StoredSignal};

pub use memory::InMemorySignalStore;
pub use signal_repo::PgSignalStore;
pub use stub::StubbedSignalStore;

/// Connection string prefix selecting the in-process store.
pub const MEMORY_STORE_URL: &str = "memory://";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("corrupt stored entity {partition_key}/{row_key}: {reason}")]
    Corrupt {
        partition_key: String,
        row_key: String,
        reason: String,
    },
}

/// Partitioned signal table.
///
/// Implementations provide per-entity atomic writes and deletes; callers do
/// no locking of their own.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError>;

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError>;

    async fn list_all(&self, filter: Option<RowKeyFilter>)
        -> Result<Vec<StoredSignal>, StoreError>;

    /// Remove one entity. Returns `false` when it was already gone.
    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError>;

    /// Distinct partition keys across the whole table.
    async fn list_partition_keys(&self) -> Result<BTreeSet<String>, StoreError> {
        let entities = self.list_all(None).await?;
        Ok(entities.into_iter().map(|e| e.partition_key).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub async fn init_pool(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Pick the store implementation the configuration asks for.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SignalStore>> {
    if config.use_stubbed_storage {
        tracing::warn!("Using stubbed storage: signals will not be stored or deleted");
        return Ok(Arc::new(StubbedSignalStore));
    }

    let url = config
        .storage_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SIGNALS_STORAGE_URL must be set unless USE_STUBBED_STORAGE=true"))?;

    if url.starts_with(MEMORY_STORE_URL) {
        tracing::warn!("Using in-memory storage: signals are lost on restart");
        return Ok(Arc::new(InMemorySignalStore::new()));
    }

    tracing::info!("Connecting to signal store...");
    let pool = init_pool(url, config.store_timeout).await?;
    let store = PgSignalStore::new(pool);
    store.migrate().await?;
    tracing::info!("Signal store connected");

    Ok(Arc::new(store))
}
