//! CLI for the Strata storage client, running against the local emulator.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use strata_core::config::{self, StrataConfig};
use strata_core::emulator::Emulator;
use strata_core::retry::{RetryPolicy, RetryPreset};
use strata_core::storage::CallOptions;
use tokio_util::sync::CancellationToken;

use commands::{run_blob, run_config, run_queue, run_share, run_table};

/// Top-level CLI for Strata.
#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(
    about = "Strata: blob, queue, table and file-share client with retries",
    long_about = None
)]
pub struct Cli {
    /// Retry preset for this invocation (default, none, aggressive). Overrides config.toml.
    #[arg(long, global = true, value_name = "PRESET")]
    pub retry: Option<RetryPreset>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the effective configuration and retry policy.
    Config,

    /// Blob containers and blobs.
    Blob {
        #[command(subcommand)]
        command: BlobCommand,
    },

    /// Message queues.
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },

    /// Tables of entities (JSON in, JSON out).
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },

    /// File shares.
    Share {
        #[command(subcommand)]
        command: ShareCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlobCommand {
    /// Create a container.
    CreateContainer { container: String },

    /// List containers.
    ListContainers,

    /// Upload a local file as a blob.
    Put {
        container: String,
        name: String,
        /// Local file to upload.
        file: PathBuf,
        /// Content type stored with the blob.
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download a blob (to stdout unless --output is given).
    Get {
        container: String,
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List blobs in a container.
    Ls {
        container: String,
        /// Only blobs whose name starts with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Delete a blob.
    Rm { container: String, name: String },
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Create a queue.
    Create { queue: String },

    /// Send a message.
    Send { queue: String, body: String },

    /// Receive messages, hiding them for the visibility timeout.
    Receive {
        queue: String,
        /// Maximum number of messages (1-32).
        #[arg(long, default_value = "1", value_name = "N")]
        max: u32,
        /// Seconds the received messages stay invisible.
        #[arg(long, default_value = "30", value_name = "SECS")]
        visibility: u64,
        /// Delete each message after printing it.
        #[arg(long)]
        delete: bool,
    },

    /// Show visible messages without receiving them.
    Peek {
        queue: String,
        #[arg(long, default_value = "1", value_name = "N")]
        max: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum TableCommand {
    /// Create a table.
    Create { table: String },

    /// Insert an entity given as JSON (with PartitionKey and RowKey).
    Insert {
        table: String,
        entity: String,
        /// Replace the entity if it already exists.
        #[arg(long)]
        upsert: bool,
    },

    /// Fetch one entity.
    Get {
        table: String,
        partition_key: String,
        row_key: String,
    },

    /// List every entity of a partition.
    Query { table: String, partition_key: String },
}

#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Create a file share.
    Create { share: String },

    /// Create a directory.
    Mkdir {
        share: String,
        path: String,
        /// Create missing parent directories too.
        #[arg(short, long)]
        parents: bool,
    },

    /// Upload a local file.
    Put {
        share: String,
        path: String,
        file: PathBuf,
    },

    /// Download a file (to stdout unless --output is given).
    Get {
        share: String,
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List a directory (the share root when no path is given).
    Ls {
        share: String,
        #[arg(default_value = "")]
        path: String,
    },
}

/// What every storage command needs: the backend and the call options.
pub struct Context {
    pub emulator: Arc<Emulator>,
    pub options: CallOptions,
}

/// Retry policy for this run: `--retry` wins over config.toml.
pub fn effective_policy(cli_preset: Option<RetryPreset>, cfg: &StrataConfig) -> RetryPolicy {
    match cli_preset {
        Some(preset) => RetryPolicy::from_preset(preset),
        None => cfg.retry_policy(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let policy = effective_policy(cli.retry, &cfg);

        if let CliCommand::Config = cli.command {
            return run_config(&cfg, &policy);
        }

        let emulator = match &cfg.emulator_path {
            Some(path) => Emulator::open_at(path)
                .await
                .with_context(|| format!("cannot open emulator at {}", path.display()))?,
            None => Emulator::open_default()
                .await
                .context("cannot open the default emulator database")?,
        };

        // Ctrl-C cancels in-flight retries instead of waiting out the backoff.
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });

        let ctx = Context {
            emulator: Arc::new(emulator),
            options: CallOptions::new(Some(policy))
                .with_classifier(cfg.classifier())
                .with_cancellation(cancel),
        };

        match cli.command {
            CliCommand::Config => {}
            CliCommand::Blob { command } => run_blob(&ctx, command).await?,
            CliCommand::Queue { command } => run_queue(&ctx, command).await?,
            CliCommand::Table { command } => run_table(&ctx, command).await?,
            CliCommand::Share { command } => run_share(&ctx, command).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
