use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{SignalStore, StoreError};
use crate::models::{RowKey, RowKeyFilter, Signal, StoredSignal};

/// In-process table keyed by `(partition_key, row_key)`.
#[derive(Debug, Default)]
pub struct InMemorySignalStore {
    rows: RwLock<BTreeMap<(String, RowKey), Signal>>,
}

impl InMemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

fn to_entity((partition_key, row_key): &(String, RowKey), signal: &Signal) -> StoredSignal {
    StoredSignal {
        partition_key: partition_key.clone(),
        row_key: *row_key,
        signal: signal.clone(),
    }
}

#[async_trait]
impl SignalStore for InMemorySignalStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        self.rows.write().await.insert(
            (entity.partition_key.clone(), entity.row_key),
            entity.signal.clone(),
        );
        Ok(())
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        let rows = self.rows.read().await;
        let start = (partition_key.to_string(), RowKey::from_millis(0));
        let end = (partition_key.to_string(), RowKey::from_millis(u64::MAX));

        Ok(rows
            .range(start..=end)
            .filter(|((_, row_key), _)| filter.map_or(true, |f| f.matches(*row_key)))
            .map(|(key, signal)| to_entity(key, signal))
            .collect())
    }

    async fn list_all(
        &self,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|((_, row_key), _)| filter.map_or(true, |f| f.matches(*row_key)))
            .map(|(key, signal)| to_entity(key, signal))
            .collect())
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        let removed = self
            .rows
            .write()
            .await
            .remove(&(partition_key.to_string(), row_key));
        Ok(removed.is_some())
    }

    async fn list_partition_keys(&self) -> Result<BTreeSet<String>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.keys().map(|(partition, _)| partition.clone()).collect())
    }
}
