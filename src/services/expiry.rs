use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use super::SignalService;
use crate::db::StoreError;
use crate::models::{RowKey, RowKeyFilter};

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entities actually deleted by this sweep. Entities another sweep
    /// removed first are not counted.
    pub deleted: usize,
    /// Entities whose delete failed and were skipped.
    pub failed: usize,
    /// False when the sweep budget ran out before every match was visited.
    pub complete: bool,
}

/// Newest row key that is old enough to expire.
pub fn expiry_cutoff(retention: chrono::Duration, now: DateTime<Utc>) -> RowKey {
    let now_millis = RowKey::from_datetime(now).millis();
    let retention_millis = u64::try_from(retention.num_milliseconds()).unwrap_or(0);
    RowKey::from_millis(now_millis.saturating_sub(retention_millis))
}

impl SignalService {
    /// Delete every signal with `row_key <= now - retention`, across all
    /// partitions.
    ///
    /// Individual delete failures are logged and skipped. The whole pass is
    /// bounded by the sweep budget; when it runs out the report is partial.
    pub async fn sweep(
        &self,
        retention: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, StoreError> {
        let started = Instant::now();
        let deadline = started + self.sweep_budget;
        let cutoff = expiry_cutoff(retention, now);

        tracing::info!(
            cutoff = %cutoff,
            now = %RowKey::from_datetime(now),
            "Deleting signals at or before cutoff"
        );

        let expired = self
            .timed(
                "list_all",
                self.store.list_all(Some(RowKeyFilter::AtOrBefore(cutoff))),
            )
            .await?;

        let mut report = SweepReport {
            complete: true,
            ..SweepReport::default()
        };

        let matching: Vec<_> = expired.iter().filter(|e| e.row_key <= cutoff).collect();

        for (visited, entity) in matching.iter().enumerate() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    deleted = report.deleted,
                    remaining = matching.len() - visited,
                    "Sweep budget exhausted, stopping early"
                );
                report.complete = false;
                break;
            }

            tracing::debug!(
                partition_key = %entity.partition_key,
                row_key = %entity.row_key,
                "Removing expired signal"
            );

            match self
                .timed("delete", self.store.delete(&entity.partition_key, entity.row_key))
                .await
            {
                Ok(true) => report.deleted += 1,
                Ok(false) => {
                    tracing::debug!(
                        partition_key = %entity.partition_key,
                        row_key = %entity.row_key,
                        "Expired signal already removed"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("sweep_delete_failures_total").increment(1);
                    tracing::warn!(
                        error = %e,
                        partition_key = %entity.partition_key,
                        row_key = %entity.row_key,
                        "Failed to delete expired signal, skipping"
                    );
                }
            }
        }

        counter!("signals_swept_total").increment(report.deleted as u64);
        tracing::info!(
            deleted = report.deleted,
            failed = report.failed,
            complete = report.complete,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sweep finished"
        );
        Ok(report)
    }
}
