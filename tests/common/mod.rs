use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use signal_store::clock::ManualClock;
use signal_store::config::{AppConfig, AuthConfig};
use signal_store::db::{InMemorySignalStore, SignalStore, StoreError};
use signal_store::models::{Action, RowKey, RowKeyFilter, Signal, StoredSignal};
use signal_store::services::SignalService;
use signal_store::AppState;

/// 2023-11-14T22:13:20Z
#[allow(dead_code)]
pub const START_MILLIS: i64 = 1_700_000_000_000;

#[allow(dead_code)]
pub const AUTH_HEADER: &str = "x-signal-key";
#[allow(dead_code)]
pub const AUTH_VALUE: &str = "super-secret-key";
#[allow(dead_code)]
pub const ORIGIN: &str = "https://signals.example.com";

/// Service over a fresh in-memory store with a manual clock.
#[allow(dead_code)]
pub fn setup_service() -> (SignalService, Arc<InMemorySignalStore>, Arc<ManualClock>) {
    let store = Arc::new(InMemorySignalStore::new());
    let clock = Arc::new(ManualClock::at_millis(START_MILLIS));
    let service = service_over(store.clone(), clock.clone());
    (service, store, clock)
}

#[allow(dead_code)]
pub fn service_over(store: Arc<dyn SignalStore>, clock: Arc<ManualClock>) -> SignalService {
    SignalService::new(store, clock, Duration::from_secs(5), Duration::from_secs(30))
}

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        storage_url: Some("memory://".into()),
        auth: Some(AuthConfig {
            header_name: AUTH_HEADER.into(),
            header_value: AUTH_VALUE.into(),
        }),
        allowed_origin: ORIGIN.into(),
        ..AppConfig::default()
    }
}

#[allow(dead_code)]
pub fn test_state(config: AppConfig) -> (AppState, Arc<InMemorySignalStore>, Arc<ManualClock>) {
    let store = Arc::new(InMemorySignalStore::new());
    let clock = Arc::new(ManualClock::at_millis(START_MILLIS));
    let metrics_handle = signal_store::metrics::init_metrics();
    let state = AppState::new(config, store.clone(), clock.clone(), metrics_handle);
    (state, store, clock)
}

#[allow(dead_code)]
pub fn signal_json(ticker: &str, action: &str, close: f64, contracts: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "ticker": ticker,
        "action": action,
        "close": close,
        "contracts": contracts,
    }))
    .unwrap()
}

/// Insert an entity with an explicit row key, bypassing the key assigner.
#[allow(dead_code)]
pub async fn seed_signal(store: &dyn SignalStore, ticker: &str, row_key: u64) -> StoredSignal {
    let entity = StoredSignal {
        partition_key: ticker.into(),
        row_key: RowKey::from_millis(row_key),
        signal: Signal {
            ticker: ticker.into(),
            action: Action::Buy,
            close: Decimal::new(1250, 2),
            contracts: 10,
            notes: String::new(),
        },
    };
    store.put(&entity).await.expect("Failed to seed signal");
    entity
}

/// Wraps a real store; deletes of the listed row keys fail.
#[allow(dead_code)]
pub struct FailingDeleteStore {
    pub inner: InMemorySignalStore,
    pub fail_on: HashSet<u64>,
}

#[async_trait]
impl SignalStore for FailingDeleteStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        self.inner.put(entity).await
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        self.inner.list_by_partition(partition_key, filter).await
    }

    async fn list_all(
        &self,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        self.inner.list_all(filter).await
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        if self.fail_on.contains(&row_key.millis()) {
            return Err(StoreError::Corrupt {
                partition_key: partition_key.into(),
                row_key: row_key.to_string(),
                reason: "injected delete failure".into(),
            });
        }
        self.inner.delete(partition_key, row_key).await
    }
}

/// Every call hangs far longer than any test timeout.
#[allow(dead_code)]
pub struct HangingStore;

#[async_trait]
impl SignalStore for HangingStore {
    async fn put(&self, _entity: &StoredSignal) -> Result<(), StoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn list_by_partition(
        &self,
        _partition_key: &str,
        _filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn list_all(
        &self,
        _filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn delete(&self, _partition_key: &str, _row_key: RowKey) -> Result<bool, StoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(false)
    }
}

/// Wraps a real store; `list_all` yields to the scheduler after reading so
/// concurrent sweeps see the same snapshot.
#[allow(dead_code)]
pub struct YieldingListStore {
    pub inner: InMemorySignalStore,
}

#[async_trait]
impl SignalStore for YieldingListStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        self.inner.put(entity).await
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        self.inner.list_by_partition(partition_key, filter).await
    }

    async fn list_all(
        &self,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        let rows = self.inner.list_all(filter).await;
        tokio::task::yield_now().await;
        rows
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        self.inner.delete(partition_key, row_key).await
    }
}

/// Wraps a real store; the first `failures` calls to `list_all` fail.
#[allow(dead_code)]
pub struct FlakyListStore {
    pub inner: InMemorySignalStore,
    pub failures: AtomicUsize,
    pub list_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyListStore {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: InMemorySignalStore::new(),
            failures: AtomicUsize::new(failures),
            list_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SignalStore for FlakyListStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        self.inner.put(entity).await
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        self.inner.list_by_partition(partition_key, filter).await
    }

    async fn list_all(
        &self,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Corrupt {
                partition_key: String::new(),
                row_key: String::new(),
                reason: "injected listing failure".into(),
            });
        }
        self.inner.list_all(filter).await
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        self.inner.delete(partition_key, row_key).await
    }
}
