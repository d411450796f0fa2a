//! CLI entry point for the pubmed-harvester tool.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use harvester_core::{
    EutilsClient, HarvestOutcome, Harvester, NoProgress, ProgressSink, TerminalProgress,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, should_show_progress};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!(term = %args.term, "PubMed harvest starting");

    let config = args.harvest_config();
    let client = EutilsClient::new(&config).context("failed to build E-utilities client")?;

    let progress: Box<dyn ProgressSink> =
        if should_show_progress(io::stderr().is_terminal(), args.quiet, args.no_progress) {
            Box::new(TerminalProgress::new())
        } else {
            Box::new(NoProgress)
        };

    let outcome = Harvester::new(&config, &client)
        .with_progress(progress.as_ref())
        .run_to_csv(&args.term, Utc::now(), &args.output)
        .await
        .with_context(|| format!("harvest for '{}' failed", args.term))?;

    match outcome {
        HarvestOutcome::Denied { local_time } => {
            println!(
                "Requests are only allowed on weekends or between 9 PM and 5 AM {} time (now {}).",
                config.timezone,
                local_time.format("%a %H:%M")
            );
        }
        HarvestOutcome::Completed { records, .. } => {
            println!(
                "Fetched {} records. Saved to {}",
                records.len(),
                args.output.display()
            );
        }
    }

    Ok(())
}
