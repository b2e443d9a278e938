//! Batched persistence of transaction events.
//!
//! One pooled connection and one transaction per batch. Each record is
//! wrapped in a savepoint: a bad event is rolled back alone, leaving no
//! partial column writes, while its siblings stay staged for the single
//! commit at batch end. Statement order follows delivery order so a
//! later event for the same identity wins within the batch.

use serde_json::{Map, Value};
use sqlx::{Connection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::error::{BatchError, RecordError};
use crate::record::{map_fields, TransactionRecord};
use crate::schema::ensure_schema;
use crate::upsert::compile_upsert;

/// How many per-record failures are echoed in the batch summary log.
const ERROR_SAMPLE_LIMIT: usize = 5;

/// Outcome counters for one batch delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub applied: usize,
    pub failed: usize,
}

/// Writes transaction events into the `transaction` table.
pub struct TransactionStorage {
    db: PgPool,
}

impl TransactionStorage {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Persist one delivered batch of raw event bodies.
    ///
    /// A normal return means every surviving record is committed and the
    /// transport may advance its checkpoint. Per-record failures are
    /// counted and logged, never propagated; schema, session, and commit
    /// failures abort the batch with nothing newly persisted and signal
    /// redelivery.
    pub async fn store_batch(&self, events: &[Vec<u8>]) -> Result<BatchStats, BatchError> {
        info!(batch_size = events.len(), "Processing transaction event batch");

        let mut conn = self.db.acquire().await.map_err(BatchError::Session)?;
        ensure_schema(&mut *conn).await.map_err(BatchError::Schema)?;

        let mut tx = conn.begin().await.map_err(BatchError::Session)?;

        let mut applied = 0;
        let mut failed = 0;
        let mut samples: Vec<(usize, String)> = Vec::new();

        for (index, payload) in events.iter().enumerate() {
            sqlx::query("SAVEPOINT event_boundary")
                .execute(&mut *tx)
                .await
                .map_err(BatchError::Session)?;

            match apply_event(&mut tx, payload).await {
                Ok(()) => {
                    sqlx::query("RELEASE SAVEPOINT event_boundary")
                        .execute(&mut *tx)
                        .await
                        .map_err(BatchError::Session)?;
                    applied += 1;
                },
                Err(e) => {
                    sqlx::query("ROLLBACK TO SAVEPOINT event_boundary")
                        .execute(&mut *tx)
                        .await
                        .map_err(BatchError::Session)?;
                    failed += 1;
                    warn!(index, error = %e, "Skipping event");
                    if samples.len() < ERROR_SAMPLE_LIMIT {
                        samples.push((index, e.to_string()));
                    }
                },
            }
        }

        tx.commit().await.map_err(BatchError::Commit)?;

        if failed > 0 {
            warn!(
                applied,
                failed,
                total = events.len(),
                "Batch committed with skipped events"
            );
            for (index, error) in &samples {
                warn!(index = *index, error = %error, "Sample failure");
            }
            if failed > ERROR_SAMPLE_LIMIT {
                warn!(
                    additional_failures = failed - ERROR_SAMPLE_LIMIT,
                    "Additional failures not shown"
                );
            }
        } else {
            info!(applied, total = events.len(), "Batch committed");
        }

        Ok(BatchStats {
            total: events.len(),
            applied,
            failed,
        })
    }
}

/// Run one event through decode, map, and upsert inside the open batch
/// transaction.
async fn apply_event(
    tx: &mut Transaction<'_, Postgres>,
    payload: &[u8],
) -> Result<(), RecordError> {
    let text = std::str::from_utf8(payload).map_err(RecordError::PayloadEncoding)?;
    let external: Map<String, Value> =
        serde_json::from_str(text).map_err(RecordError::PayloadJson)?;

    let record = TransactionRecord::from_canonical(map_fields(external))?;
    if !record.extra.is_empty() {
        debug!(
            id = %record.id,
            fields = ?record.extra.keys().collect::<Vec<_>>(),
            "Ignoring unrecognized fields"
        );
    }

    compile_upsert(&record)
        .execute(&mut **tx)
        .await
        .map_err(RecordError::Persist)?;

    Ok(())
}
