use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::{RowKey, Signal};

/// Assigns `(partition_key, row_key)` to newly ingested signals.
///
/// Row keys come from a single process-wide "last issued" value: each call
/// issues `max(now_millis, last + 1)`, so keys are unique and strictly
/// increasing even when several callers land in the same millisecond.
pub struct KeyAssigner {
    clock: Arc<dyn Clock>,
    last_issued: AtomicU64,
}

impl KeyAssigner {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_issued: AtomicU64::new(0),
        }
    }

    pub fn assign(&self, signal: &Signal) -> (String, RowKey) {
        (signal.ticker.clone(), self.next_row_key())
    }

    pub fn next_row_key(&self) -> RowKey {
        let now = RowKey::from_datetime(self.clock.now()).millis();
        let previous = self
            .last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        RowKey::from_millis(now.max(previous.saturating_add(1)))
    }
}
