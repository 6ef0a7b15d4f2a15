// src/main.rs

//! Harvester CLI
//!
//! Crawls the arXiv advanced search for the configured criteria, keeps a
//! local paper database, and renders it to markdown or CSV.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use harvester::error::Result;
use harvester::models::Config;
use harvester::pipeline;
use harvester::storage::{export, LocalStore};

/// harvester - arXiv paper metadata harvester
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests paper metadata from the arXiv advanced search"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Directory holding the paper database
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every result page for the configured criteria
    Crawl {
        /// Override the start of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Override the end of the date range (YYYY-MM-DD, exclusive)
        #[arg(long)]
        until: Option<String>,
    },

    /// Fetch newest results until an already-known record appears
    Update {
        /// Override the start of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Override the end of the date range (YYYY-MM-DD, exclusive)
        #[arg(long)]
        until: Option<String>,
    },

    /// Render the stored papers to a file
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,

        /// Include search metadata in markdown output
        #[arg(long)]
        meta: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Markdown,
    Csv,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Cancel the returned token when the process receives an interrupt.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, aborting run...");
            child.cancel();
        }
    });
    token
}

fn apply_range(config: &mut Config, from: Option<String>, until: Option<String>) {
    if from.is_some() {
        config.search.date_from = from;
    }
    if until.is_some() {
        config.search.date_until = until;
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    let store = LocalStore::new(&cli.storage_dir);

    match cli.command {
        Command::Crawl { from, until } => {
            apply_range(&mut config, from, until);
            config.validate()?;

            let cancel = cancel_on_interrupt();
            let summary = pipeline::run_full_crawl(&config, &store, &cancel).await?;
            log::info!(
                "Harvested {}/{} records over {} pages",
                summary.harvested,
                summary.total,
                summary.pages
            );
        }

        Command::Update { from, until } => {
            apply_range(&mut config, from, until);
            config.validate()?;

            let cancel = cancel_on_interrupt();
            let summary = pipeline::run_update(&config, &store, &cancel).await?;
            log::info!(
                "Submitted {} records over {} pages",
                summary.harvested,
                summary.pages
            );
        }

        Command::Export { format, meta } => {
            let criteria = config.search.criteria()?;
            let path = match format {
                ExportFormat::Markdown => {
                    export::to_markdown(
                        &store,
                        &config.output.dir,
                        &config.output.filename_format,
                        &criteria,
                        meta,
                    )
                    .await?
                }
                ExportFormat::Csv => {
                    export::to_csv(
                        &store,
                        &config.output.dir,
                        &config.output.filename_format,
                        &export::CsvConfig::default(),
                    )
                    .await?
                }
            };
            log::info!("Exported to {}", path.display());
        }

        Command::Validate => {
            config.validate()?;
            log::info!("Config OK");
        }
    }

    Ok(())
}
