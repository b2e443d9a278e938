//! Pipeline error taxonomy.
//!
//! Two failure domains with different blast radii: [`BatchError`] aborts
//! a whole delivery and tells the transport to redeliver it, while
//! [`RecordError`] is contained by the batch processor and only ever
//! costs the one record it names.

use thiserror::Error;

use crate::record::TransformError;

/// Failures that abort an entire batch delivery.
///
/// The transport must not advance its checkpoint when it sees one of
/// these; redelivering the whole batch is safe because every write is an
/// idempotent upsert keyed by record identity.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The destination table could not be ensured; no records were
    /// attempted.
    #[error("failed to ensure destination schema: {0}")]
    Schema(#[source] sqlx::Error),

    /// Connection acquisition, transaction begin, or savepoint handling
    /// failed. Uncommitted work is rolled back by the store.
    #[error("database session failed: {0}")]
    Session(#[source] sqlx::Error),

    /// The final commit failed; the store rolled back every record in
    /// the batch.
    #[error("failed to commit batch: {0}")]
    Commit(#[source] sqlx::Error),
}

/// Failures isolated to a single record within a batch.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("event payload is not valid UTF-8: {0}")]
    PayloadEncoding(#[source] std::str::Utf8Error),

    #[error("event payload is not a JSON object: {0}")]
    PayloadJson(#[source] serde_json::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("failed to execute upsert: {0}")]
    Persist(#[source] sqlx::Error),
}
