use std::collections::BTreeSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{SignalStore, StoreError};
use crate::models::{Action, RowKey, RowKeyFilter, Signal, StoredSignal};

/// Database row for the `signals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SignalRow {
    partition_key: String,
    row_key: i64,
    ticker: String,
    action: String,
    close: Decimal,
    contracts: i32,
    notes: String,
}

impl TryFrom<SignalRow> for StoredSignal {
    type Error = StoreError;

    fn try_from(row: SignalRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            partition_key: row.partition_key.clone(),
            row_key: row.row_key.to_string(),
            reason,
        };

        let row_key = u64::try_from(row.row_key)
            .map(RowKey::from_millis)
            .map_err(|_| corrupt("negative row key".into()))?;
        let action = Action::parse(&row.action)
            .ok_or_else(|| corrupt(format!("unknown action {:?}", row.action)))?;
        let contracts = u32::try_from(row.contracts)
            .map_err(|_| corrupt(format!("negative contracts {}", row.contracts)))?;

        Ok(StoredSignal {
            partition_key: row.partition_key,
            row_key,
            signal: Signal {
                ticker: row.ticker,
                action,
                close: row.close,
                contracts,
                notes: row.notes,
            },
        })
    }
}

fn row_key_param(row_key: RowKey) -> Result<i64, StoreError> {
    i64::try_from(row_key.millis()).map_err(|_| StoreError::Corrupt {
        partition_key: String::new(),
        row_key: row_key.to_string(),
        reason: "row key exceeds BIGINT range".into(),
    })
}

/// Inclusive upper row-key bound for a filter, if any.
fn upper_bound(filter: Option<RowKeyFilter>) -> Result<Option<i64>, StoreError> {
    filter
        .map(|RowKeyFilter::AtOrBefore(cutoff)| row_key_param(cutoff))
        .transpose()
}

fn into_entities(rows: Vec<SignalRow>) -> Result<Vec<StoredSignal>, StoreError> {
    rows.into_iter().map(StoredSignal::try_from).collect()
}

/// PostgreSQL-backed signal table. Row keys are `BIGINT`, so range filters
/// and ordering are numeric on the server side.
#[derive(Debug, Clone)]
pub struct PgSignalStore {
    pool: PgPool,
}

impl PgSignalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SignalStore for PgSignalStore {
    async fn put(&self, entity: &StoredSignal) -> Result<(), StoreError> {
        let contracts = i32::try_from(entity.signal.contracts).map_err(|_| StoreError::Corrupt {
            partition_key: entity.partition_key.clone(),
            row_key: entity.row_key.to_string(),
            reason: "contracts exceeds INTEGER range".into(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO signals (partition_key, row_key, ticker, action, close, contracts, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entity.partition_key)
        .bind(row_key_param(entity.row_key)?)
        .bind(&entity.signal.ticker)
        .bind(entity.signal.action.as_str())
        .bind(entity.signal.close)
        .bind(contracts)
        .bind(&entity.signal.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_partition(
        &self,
        partition_key: &str,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        let at_or_before = upper_bound(filter)?;
        let rows = sqlx::query_as::<_, SignalRow>(
            r#"
            SELECT partition_key, row_key, ticker, action, close, contracts, notes
            FROM signals
            WHERE partition_key = $1
              AND ($2::BIGINT IS NULL OR row_key <= $2)
            ORDER BY row_key DESC
            "#,
        )
        .bind(partition_key)
        .bind(at_or_before)
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    async fn list_all(
        &self,
        filter: Option<RowKeyFilter>,
    ) -> Result<Vec<StoredSignal>, StoreError> {
        let at_or_before = upper_bound(filter)?;
        let rows = sqlx::query_as::<_, SignalRow>(
            r#"
            SELECT partition_key, row_key, ticker, action, close, contracts, notes
            FROM signals
            WHERE ($1::BIGINT IS NULL OR row_key <= $1)
            ORDER BY partition_key, row_key
            "#,
        )
        .bind(at_or_before)
        .fetch_all(&self.pool)
        .await?;

        into_entities(rows)
    }

    async fn delete(&self, partition_key: &str, row_key: RowKey) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM signals WHERE partition_key = $1 AND row_key = $2")
            .bind(partition_key)
            .bind(row_key_param(row_key)?)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_partition_keys(&self) -> Result<BTreeSet<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT partition_key FROM signals ORDER BY partition_key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action: &str, row_key: i64, contracts: i32) -> SignalRow {
        SignalRow {
            partition_key: "ACME".into(),
            row_key,
            ticker: "ACME".into(),
            action: action.into(),
            close: Decimal::new(1250, 2),
            contracts,
            notes: String::new(),
        }
    }

    #[test]
    fn test_row_converts_to_entity() {
        let entity = StoredSignal::try_from(row("sell", 1_700_000_000_000, 3)).unwrap();
        assert_eq!(entity.row_key, RowKey::from_millis(1_700_000_000_000));
        assert_eq!(entity.signal.action, Action::Sell);
        assert_eq!(entity.signal.contracts, 3);
    }

    #[test]
    fn test_corrupt_rows_are_rejected() {
        assert!(matches!(
            StoredSignal::try_from(row("hold", 1, 1)),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            StoredSignal::try_from(row("buy", -1, 1)),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            StoredSignal::try_from(row("buy", 1, -1)),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_filter_bound() {
        assert_eq!(upper_bound(None).unwrap(), None);
        assert_eq!(
            upper_bound(Some(RowKeyFilter::AtOrBefore(RowKey::from_millis(500)))).unwrap(),
            Some(500)
        );
        assert!(upper_bound(Some(RowKeyFilter::AtOrBefore(RowKey::from_millis(u64::MAX)))).is_err());
    }
}
