use metrics::counter;

use super::validator::{self, Violation};
use super::IngestError;
use crate::models::{SignalPayload, StoredSignal};
use crate::services::SignalService;

impl SignalService {
    /// Ingest one raw signal message:
    /// 1. Reject empty or unparseable payloads
    /// 2. Validate every field constraint
    /// 3. Assign partition and row keys
    /// 4. Write the keyed entity to the store
    pub async fn ingest(&self, raw: &[u8]) -> Result<(), IngestError> {
        if raw.iter().all(|b| b.is_ascii_whitespace()) {
            counter!("signals_rejected_total", "reason" => "malformed").increment(1);
            tracing::warn!("Signal payload is empty");
            return Err(IngestError::MalformedPayload("payload is empty".into()));
        }

        let payload: SignalPayload = match serde_json::from_slice(raw) {
            Ok(payload) => payload,
            Err(e) => {
                counter!("signals_rejected_total", "reason" => "malformed").increment(1);
                tracing::warn!(error = %e, "Signal payload is not valid JSON");
                return Err(IngestError::MalformedPayload(e.to_string()));
            }
        };

        self.ingest_payload(&payload).await
    }

    /// Steps 2–4 of [`SignalService::ingest`] for an already parsed payload.
    pub async fn ingest_payload(&self, payload: &SignalPayload) -> Result<(), IngestError> {
        let signal = match validator::into_signal(payload) {
            Ok(signal) => signal,
            Err(result) => {
                counter!("signals_rejected_total", "reason" => "invalid").increment(1);
                log_violations(
                    payload.ticker.as_deref().unwrap_or_default(),
                    &result.violations,
                );
                return Err(IngestError::InvalidSignal {
                    violations: result.violations,
                });
            }
        };

        let (partition_key, row_key) = self.keys.assign(&signal);
        let entity = StoredSignal {
            partition_key,
            row_key,
            signal,
        };

        self.timed("put", self.store.put(&entity)).await?;

        counter!("signals_ingested_total").increment(1);
        tracing::info!(
            partition_key = %entity.partition_key,
            row_key = %entity.row_key,
            action = %entity.signal.action,
            "New signal stored"
        );
        Ok(())
    }
}

fn log_violations(ticker: &str, violations: &[Violation]) {
    for v in violations {
        tracing::warn!(ticker, field = v.field, "{}", v.message);
    }
    tracing::warn!(
        ticker,
        count = violations.len(),
        "Validation failures in signal, rejected"
    );
}
