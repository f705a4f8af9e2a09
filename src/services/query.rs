use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::SignalService;
use crate::db::StoreError;
use crate::models::StoredSignal;

/// Newest first, by numeric row key, with notes annotated.
pub fn order_and_annotate(mut signals: Vec<StoredSignal>) -> Vec<StoredSignal> {
    signals.sort_by_key(|s| Reverse(s.row_key));
    signals
        .into_iter()
        .map(|s| StoredSignal {
            signal: s.signal.annotated(s.row_key),
            ..s
        })
        .collect()
}

impl SignalService {
    /// All signals for `ticker`, newest first. Each result carries a
    /// `timestamp=<row_key>` note; the stored records are never touched.
    pub async fn query_by_ticker(&self, ticker: &str) -> Result<Vec<StoredSignal>, StoreError> {
        let signals = self
            .timed("list_by_partition", self.store.list_by_partition(ticker, None))
            .await?;

        // The store filters by partition already; stub stores may not.
        let signals: Vec<StoredSignal> = signals
            .into_iter()
            .filter(|s| s.partition_key == ticker)
            .collect();

        tracing::info!(ticker, count = signals.len(), "Query for ticker");
        Ok(order_and_annotate(signals))
    }

    /// Distinct tickers across the whole table, ascending.
    pub async fn list_tickers(&self) -> Result<BTreeSet<String>, StoreError> {
        let tickers = self
            .timed("list_partition_keys", self.store.list_partition_keys())
            .await?;
        tracing::debug!(count = tickers.len(), "Listed tickers");
        Ok(tickers)
    }
}
