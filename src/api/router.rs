use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use super::origin::require_origin;
use super::request_log::log_request;
use crate::config::{origin_matches, AppConfig};
use crate::AppState;

const CORS_MAX_AGE: Duration = Duration::from_secs(600);

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected routes: allowed origin first, then the configured auth header when set
    let protected = Router::new()
        .route("/signals/tickers", get(handlers::signals::tickers))
        .route(
            "/signals",
            post(handlers::signals::ingest).delete(handlers::signals::sweep),
        )
        .route("/signals/:ticker", get(handlers::signals::by_ticker))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(middleware::from_fn_with_state(state.clone(), require_origin));

    let cors = cors_layer(&state.config);

    public
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), log_request))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS preflight handling: allowed origin comes from config, `*` allows any
/// and `*.example.com` allows any origin ending in `.example.com`.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let mut allowed_headers = vec![header::ACCEPT, header::CONTENT_TYPE, header::CONTENT_LENGTH];
    if let Some(auth) = &config.auth {
        match HeaderName::try_from(auth.header_name.as_str()) {
            Ok(name) => allowed_headers.push(name),
            Err(e) => tracing::warn!(error = %e, "Auth header name is not a valid header"),
        }
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list(allowed_headers))
        .max_age(CORS_MAX_AGE);

    if config.allows_any_origin() {
        tracing::warn!("All origins are allowed, confirm ALLOWED_ORIGIN for production");
        return cors.allow_origin(Any);
    }

    let allowed = config.allowed_origin.clone();
    cors.allow_origin(AllowOrigin::predicate(move |origin, _parts| {
        origin
            .to_str()
            .map(|o| origin_matches(&allowed, o))
            .unwrap_or(false)
    }))
}
