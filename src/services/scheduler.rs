use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};

use super::SignalService;
use crate::clock::Clock;

/// Periodically sweep expired signals. Never returns; failures are logged
/// and the next tick tries again.
pub async fn run_expiry_scheduler(
    service: Arc<SignalService>,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    interval_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        tracing::debug!("Expiry scheduler: running sweep");

        match service.sweep(retention, clock.now()).await {
            Ok(report) if !report.complete => {
                tracing::warn!(
                    deleted = report.deleted,
                    failed = report.failed,
                    "Scheduled sweep stopped early, remaining signals wait for the next run"
                );
            }
            Ok(report) => {
                tracing::info!(
                    deleted = report.deleted,
                    failed = report.failed,
                    "Scheduled sweep complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled sweep failed");
            }
        }
    }
}
