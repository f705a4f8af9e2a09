use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::AppState;

/// Header-key authentication middleware.
///
/// When auth is configured, every request must carry the configured header
/// with exactly the configured value. Without an auth config the check is
/// disabled (dev mode).
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(auth) = state.config.auth.as_ref() else {
        return next.run(req).await;
    };

    if is_authorized(auth, &req) {
        next.run(req).await
    } else {
        tracing::warn!(
            header = %auth.header_name,
            path = %req.uri().path(),
            "Request not authorized"
        );
        AppError::Unauthorized.into_response()
    }
}

fn is_authorized(auth: &AuthConfig, req: &Request) -> bool {
    let mut values = req.headers().get_all(auth.header_name.as_str()).iter();

    match (values.next(), values.next()) {
        (Some(value), None) => value
            .to_str()
            .map(|v| v == auth.header_value)
            .unwrap_or(false),
        // Missing, or sent more than once.
        _ => false,
    }
}
