//! fullsync CLI
//!
//! Command-line driver for resumable full syncs over JSON datasets.
//!
//! # Commands
//!
//! - `run` - Advance a full sync by one time-boxed invocation
//! - `partition` - Split a module's ids into ascending windows
//! - `estimate` - Count records, chunks and invocations per module
//! - `checksum` - Print the drift checksum of a JSON document
//! - `snapshot` - Send a JSON document unless its checksum is unchanged
//! - `status` - Show persisted progress
//! - `reset` - Forget persisted progress

mod commands;
mod error;
mod outbox;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Resumable full-sync tools.
#[derive(Parser)]
#[command(name = "fullsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a full sync by one time-boxed invocation
    Run {
        /// Dataset JSON file
        #[arg(short, long)]
        dataset: PathBuf,

        /// Transmission limits JSON file
        #[arg(short, long)]
        limits: PathBuf,

        /// Directory holding persisted progress
        #[arg(short, long)]
        state_dir: PathBuf,

        /// JSON-lines file receiving transmitted messages
        #[arg(short, long)]
        outbox: PathBuf,

        /// Module to sync, in order (repeatable)
        #[arg(short, long = "module", required = true)]
        modules: Vec<String>,

        /// Time budget in milliseconds
        #[arg(short, long, default_value = "10000")]
        budget_ms: u64,

        /// Per-module full-sync configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Split a module's ids into ascending windows
    Partition {
        /// Dataset JSON file
        #[arg(short, long)]
        dataset: PathBuf,

        /// Module to partition
        #[arg(short, long)]
        module: String,

        /// Ids per window
        #[arg(short, long, default_value = "1000")]
        batch_size: usize,

        /// Per-module full-sync configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Count records, chunks and invocations per module
    Estimate {
        /// Dataset JSON file
        #[arg(short, long)]
        dataset: PathBuf,

        /// Transmission limits JSON file
        #[arg(short, long)]
        limits: PathBuf,

        /// Module to estimate (repeatable)
        #[arg(short, long = "module", required = true)]
        modules: Vec<String>,

        /// Per-module full-sync configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the drift checksum of a JSON document
    Checksum {
        /// JSON file
        file: PathBuf,
    },

    /// Send a JSON document unless its checksum is unchanged
    Snapshot {
        /// Directory holding persisted progress
        #[arg(short, long)]
        state_dir: PathBuf,

        /// JSON-lines file receiving transmitted messages
        #[arg(short, long)]
        outbox: PathBuf,

        /// Snapshot name
        #[arg(short, long)]
        name: String,

        /// JSON file
        file: PathBuf,
    },

    /// Show persisted progress
    Status {
        /// Directory holding persisted progress
        #[arg(short, long)]
        state_dir: PathBuf,

        /// Only this module
        #[arg(short, long)]
        module: Option<String>,

        /// Also count messages in this outbox
        #[arg(short, long)]
        outbox: Option<PathBuf>,
    },

    /// Forget persisted progress
    Reset {
        /// Directory holding persisted progress
        #[arg(short, long)]
        state_dir: PathBuf,

        /// Module to reset (repeatable); all when omitted
        #[arg(short, long = "module")]
        modules: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            dataset,
            limits,
            state_dir,
            outbox,
            modules,
            budget_ms,
            config,
        } => {
            commands::run::run(&commands::run::RunArgs {
                dataset: &dataset,
                limits: &limits,
                state_dir: &state_dir,
                outbox: &outbox,
                modules: &modules,
                budget: Duration::from_millis(budget_ms),
                config: config.as_deref(),
            })?;
        }
        Commands::Partition {
            dataset,
            module,
            batch_size,
            config,
        } => {
            commands::partition::run(&dataset, &module, batch_size, config.as_deref(), cli.format)?;
        }
        Commands::Estimate {
            dataset,
            limits,
            modules,
            config,
        } => {
            commands::estimate::run(&dataset, &limits, &modules, config.as_deref(), cli.format)?;
        }
        Commands::Checksum { file } => {
            commands::checksum::run(&file)?;
        }
        Commands::Snapshot {
            state_dir,
            outbox,
            name,
            file,
        } => {
            commands::snapshot::run(&state_dir, &outbox, &name, &file)?;
        }
        Commands::Status {
            state_dir,
            module,
            outbox,
        } => {
            commands::state::run_status(
                &state_dir,
                module.as_deref(),
                outbox.as_deref(),
                cli.format,
            )?;
        }
        Commands::Reset { state_dir, modules } => {
            commands::state::run_reset(&state_dir, &modules)?;
        }
        Commands::Version => {
            println!("fullsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Encoding version {}", fullsync_codec::ENCODING_VERSION);
        }
    }

    Ok(())
}
