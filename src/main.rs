//! dirgraph - ingest a directory tree into a containment graph and report
//! how its bytes spread over file age and size.
//!
//! Usage:
//!   dirgraph scan --path /data                 Ingest a directory tree
//!   dirgraph scan --path /data --prefix /scan --count 3
//!                                              Ingest three copies under /scan000../scan002
//!   dirgraph count --path /data                Age × size report
//!   dirgraph clean --path /data                Remove an ingested subtree
//!   dirgraph truncate                          Empty the store
//!   dirgraph --help                            Show help

mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};

use dirgraph_core::IngestConfig;
use dirgraph_ingest::ScanPlan;

use crate::logging::Verbosity;

#[derive(Parser)]
#[command(
    name = "dirgraph",
    version,
    about = "Ingest a directory tree into a graph and report file age and size",
    long_about = "dirgraph walks a directory tree into a graph of directory and file \
                  nodes linked by containment edges, then reports how many bytes fall \
                  into each file age and size bucket."
)]
struct Cli {
    /// Snapshot file the graph is loaded from and saved to
    #[arg(long, global = true, default_value = "dirgraph.json")]
    store: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// Which directory a command applies to.
#[derive(Args, Debug, Clone)]
struct Target {
    /// Path to command
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Prefix added to each recorded path, like '/neo/scan1'
    #[arg(long, default_value = "")]
    prefix: String,

    /// Number of runs; adds a three-digit suffix to the prefix
    #[arg(short, long, default_value = "0")]
    count: u32,

    /// First run suffix, only used with --count
    #[arg(long, default_value = "0")]
    start: u32,
}

impl Target {
    fn plan(&self) -> ScanPlan {
        ScanPlan::new(&self.path)
            .with_prefix(self.prefix.as_str())
            .with_runs(self.count, self.start)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Remove every edge, directory and file
    Truncate,

    /// Remove an ingested subtree
    Clean {
        #[command(flatten)]
        target: Target,
    },

    /// Walk a directory tree into the store
    Scan {
        #[command(flatten)]
        target: Target,

        /// Number of file workers (defaults to 5/6 of the available cores)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Report file bytes by age and size
    Count {
        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Command::Truncate => commands::truncate(&cli.store)?,
        Command::Clean { target } => commands::clean(&cli.store, &target.plan())?,
        Command::Scan { target, workers } => {
            let mut builder = IngestConfig::builder();
            if let Some(workers) = workers {
                builder.worker_count(workers);
            }
            let config = builder.build().wrap_err("Invalid ingest configuration")?;
            commands::scan(&cli.store, &target.plan(), config).await?;
        }
        Command::Count { target, format } => {
            commands::count(&cli.store, &target.plan(), format)?;
        }
    }

    Ok(())
}
