use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::StoredSignal;
use crate::services::SweepReport;
use crate::AppState;

#[derive(Serialize)]
pub struct Results<T: Serialize> {
    pub results: Vec<T>,
}

/// `GET /signals/tickers`
pub async fn tickers(State(state): State<AppState>) -> Result<Json<Results<String>>, AppError> {
    let tickers = state.signals.list_tickers().await?;
    Ok(Json(Results {
        results: tickers.into_iter().collect(),
    }))
}

/// `GET /signals/:ticker`
pub async fn by_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Results<StoredSignal>>, AppError> {
    let signals = state.signals.query_by_ticker(&ticker).await?;
    Ok(Json(Results { results: signals }))
}

/// `POST /signals`. The body is handed to the ingestion path unparsed so
/// malformed JSON goes through the same rejection path as invalid fields.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    state.signals.ingest(&body).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "success": true }))))
}

/// `DELETE /signals`: sweep with the configured retention as of now.
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    let report = state
        .signals
        .sweep(state.config.retention, state.clock.now())
        .await?;
    Ok(Json(report))
}
