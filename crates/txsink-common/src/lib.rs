//! txsink Common Library
//!
//! Shared error handling and logging bootstrap for the txsink workspace.
//!
//! # Example
//!
//! ```no_run
//! use txsink_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TxSinkError};
