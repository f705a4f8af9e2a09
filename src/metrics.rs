use std::sync::OnceLock;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only one recorder can exist per process: repeated calls return the same
/// handle, and if another recorder is already installed the handle is
/// detached and renders nothing.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                // Pre-register counters so they appear even before the first increment.
                counter!("signals_ingested_total").absolute(0);
                counter!("signals_swept_total").absolute(0);
                counter!("sweep_delete_failures_total").absolute(0);

                // Histogram is lazily created on first record; force creation.
                histogram!("store_call_seconds", "op" => "ping").record(0.0);

                handle
            }
            Err(e) => {
                tracing::warn!(error = %e, "Metrics recorder already installed, using detached handle");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}
