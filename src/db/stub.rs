use async_trait::async_trait;

use super::{SignalStore, StoreError};
use crate::models::{RowKey, RowKeyFilter, StoredSignal};

/// No-op sink for environments without a live table.
///
/// Writes and deletes are discarded, listings are always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubbedSignalStore;

#[async_trait]
impl SignalStore for StubbedSignalStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        tracing::warn!(
            partition_key = %entity.partition_key,
            row_key = %entity.row_key,
            "Stubbed storage: signal not stored"
        );
        Ok(())
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        _filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        tracing::warn!(partition_key, "Stubbed storage: returning no signals");
        Ok(Vec::new())
    }

    async fn list_all(
        &self,
        _filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        tracing::warn!("Stubbed storage: returning no signals");
        Ok(Vec::new())
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        tracing::warn!(partition_key, row_key = %row_key, "Stubbed storage: nothing deleted");
        Ok(false)
    }
}
