pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::db::SignalStore;
use crate::services::SignalService;

#[derive(Clone)]
pub struct AppState {
    pub signals: Arc<SignalService>,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn SignalStore>,
        clock: Arc<dyn Clock>,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        let signals = Arc::new(SignalService::new(
            store,
            clock.clone(),
            config.store_timeout,
            config.sweep_budget,
        ));
        Self {
            signals,
            clock,
            config,
            metrics_handle,
        }
    }
}
