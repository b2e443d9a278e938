//! txsink Ingest Library
//!
//! Batched persistence of transaction events into PostgreSQL.
//!
//! # Overview
//!
//! The upstream transport delivers ordered batches of opaque event bodies
//! with at-least-once semantics. Each body is decoded as JSON, its
//! producer-side field names are mapped to the storage schema, and the
//! result is upserted into the `transaction` table keyed by record `id`.
//! A batch runs in a single transaction with per-record failure
//! isolation: one malformed event is skipped and logged while its
//! siblings commit together.
//!
//! # Example
//!
//! ```no_run
//! use txsink_ingest::{config::Config, db, storage::TransactionStorage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let storage = TransactionStorage::new(pool);
//!
//!     let batch: Vec<Vec<u8>> = vec![br#"{"id":"tx-1"}"#.to_vec()];
//!     let stats = storage.store_batch(&batch).await?;
//!     println!("applied {} of {}", stats.applied, stats.total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod record;
pub mod schema;
pub mod storage;
pub mod upsert;

// Re-export commonly used types
pub use error::{BatchError, RecordError};
pub use record::TransactionRecord;
pub use storage::{BatchStats, TransactionStorage};
