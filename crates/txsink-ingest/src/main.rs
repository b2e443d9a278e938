//! txsink Ingest - transaction sink operations tool

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use txsink_common::logging::{init_logging, LogConfig, LogLevel};
use txsink_ingest::config::Config;
use txsink_ingest::db;
use txsink_ingest::storage::TransactionStorage;

#[derive(Parser, Debug)]
#[command(name = "txsink-ingest")]
#[command(author, version, about = "Transaction event sink operations tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Replay event bodies from a file into the transaction store
    Replay {
        /// File of event bodies, one JSON object per line
        #[arg(short, long)]
        file: PathBuf,

        /// Events per batch
        #[arg(short, long, default_value_t = 500)]
        batch_size: usize,
    },

    /// Check database connectivity
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder().level(log_level).build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    let config = Config::load()?;
    let pool = db::create_pool(&config.database).await?;

    match cli.command {
        Command::Replay { file, batch_size } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let events: Vec<Vec<u8>> = raw
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.as_bytes().to_vec())
                .collect();
            info!(events = events.len(), batch_size, "Replaying events");

            let storage = TransactionStorage::new(pool);
            let mut applied = 0;
            let mut failed = 0;
            for batch in events.chunks(batch_size.max(1)) {
                let stats = storage.store_batch(batch).await?;
                applied += stats.applied;
                failed += stats.failed;
            }
            info!(applied, failed, "Replay complete");
        },
        Command::Health => {
            db::health_check(&pool).await?;
            info!("Database connection healthy");
        },
    }

    Ok(())
}
