pub mod expiry;
pub mod query;
pub mod scheduler;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};

use crate::clock::Clock;
use crate::db::{SignalStore, StoreError};
use crate::ingestion::key_assigner::KeyAssigner;

pub use expiry::SweepReport;

/// Shared context for the ingestion, query and sweep paths.
///
/// Cheap to share behind an `Arc`; every operation is safe to run
/// concurrently against the same store.
pub struct SignalService {
    pub(crate) store: Arc<dyn SignalStore>,
    pub(crate) keys: KeyAssigner,
    pub(crate) store_timeout: Duration,
    pub(crate) sweep_budget: Duration,
}

impl SignalService {
    pub fn new(
        store: Arc<dyn SignalStore>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
        sweep_budget: Duration,
    ) -> Self {
        Self {
            store,
            keys: KeyAssigner::new(clock),
            store_timeout,
            sweep_budget,
        }
    }

    /// Run one store call under the configured timeout.
    pub(crate) async fn timed<T, F>(&self, op: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout)),
        };
        histogram!("store_call_seconds", "op" => op).record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            counter!("store_failures_total", "op" => op).increment(1);
            tracing::error!(error = %e, op, "Store call failed");
        }
        result
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.timed("ping", self.store.ping()).await
    }
}
