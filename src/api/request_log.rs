use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::AppState;

/// Largest body copied into a request dump.
const MAX_DUMP_BYTES: usize = 1024 * 1024;

const REDACTED: &str = "<redacted>";

/// Tag every request with a fresh request id and log how long it took.
/// With `LOG_REQUESTS` on, the full request is dumped first.
pub async fn log_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let start = Instant::now();

        let req = if state.config.log_requests {
            match dump_request(req, state.config.auth.as_ref()).await {
                Ok(req) => req,
                Err(e) => return e.into_response(),
            }
        } else {
            req
        };

        let response = next.run(req).await;
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

/// Log headers and body, then rebuild the request so handlers still see the
/// body. The auth header value is never logged.
async fn dump_request(req: Request, auth: Option<&AuthConfig>) -> Result<Request, AppError> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_DUMP_BYTES).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read request body for dump");
        AppError::BadRequest("request body could not be read".into())
    })?;

    tracing::info!(
        uri = %parts.uri,
        version = ?parts.version,
        headers = ?redacted_headers(&parts.headers, auth),
        body = %String::from_utf8_lossy(&bytes),
        "Logged request"
    );

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

fn redacted_headers(headers: &HeaderMap, auth: Option<&AuthConfig>) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let secret = auth.is_some_and(|a| name.as_str().eq_ignore_ascii_case(&a.header_name));
            let value = if secret {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.to_string(), value)
        })
        .collect()
}
