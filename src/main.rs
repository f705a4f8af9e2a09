use std::sync::Arc;

use signal_store::api::router::create_router;
use signal_store::clock::{Clock, SystemClock};
use signal_store::config::AppConfig;
use signal_store::services::scheduler::run_expiry_scheduler;
use signal_store::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    if config.auth.is_none() {
        tracing::warn!("AUTH_HEADER_NAME/AUTH_HEADER_KEY not set, authentication disabled");
    }

    let store = db::build_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics_handle = metrics::init_metrics();

    let state = AppState::new(config, store, clock.clone(), metrics_handle);

    // --- Retention: periodic expiry sweep ---
    if state.config.sweep_interval_secs > 0 {
        let service = state.signals.clone();
        let retention = state.config.retention;
        let interval_secs = state.config.sweep_interval_secs;
        tracing::info!(
            retention_days = retention.num_days(),
            interval_secs,
            "Expiry scheduler spawned"
        );
        tokio::spawn(async move {
            run_expiry_scheduler(service, clock, retention, interval_secs).await;
        });
    } else {
        tracing::info!("Expiry scheduler disabled (SWEEP_INTERVAL_SECS=0)");
    }

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
