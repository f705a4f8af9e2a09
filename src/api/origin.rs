use axum::{
    extract::{Request, State},
    http::header::ORIGIN,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::AppState;

/// Reject requests from origins outside `ALLOWED_ORIGIN`.
///
/// With `*` every request passes. Otherwise the `Origin` header must be
/// present and every value must end with the configured domain.
pub async fn require_origin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if is_origin_allowed(&state.config, &req) {
        next.run(req).await
    } else {
        tracing::warn!(
            allowed = %state.config.allowed_origin,
            path = %req.uri().path(),
            "Origin not allowed"
        );
        AppError::Unauthorized.into_response()
    }
}

fn is_origin_allowed(config: &AppConfig, req: &Request) -> bool {
    if config.allows_any_origin() {
        return true;
    }

    let mut origins = req.headers().get_all(ORIGIN).iter().peekable();
    if origins.peek().is_none() {
        tracing::debug!("Origin header missing");
        return false;
    }

    origins.all(|origin| {
        origin
            .to_str()
            .map(|o| config.is_origin_allowed(o))
            .unwrap_or(false)
    })
}
