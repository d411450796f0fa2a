//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;

use harvester_core::HarvestConfig;
use harvester_core::config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RESULTS, DEFAULT_TIMEZONE, parse_timezone,
};

/// Default location of the output table.
pub const DEFAULT_OUTPUT: &str = "upload_data/output.csv";

/// Harvest PubMed records for a search term into a CSV table.
///
/// Bulk access is only attempted on weekends or between 21:00 and 05:00 in
/// the provider's timezone; outside that window the tool exits without
/// contacting the server.
#[derive(Parser, Debug)]
#[command(name = "pubmed-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// PubMed search term (query syntax as on pubmed.ncbi.nlm.nih.gov)
    #[arg(short, long)]
    pub term: String,

    /// Output CSV path (parent directories are created)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Maximum number of ids to store from the search
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_RESULTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_results: u32,

    /// IANA timezone the access window is evaluated in
    #[arg(long, default_value_t = DEFAULT_TIMEZONE, value_parser = parse_timezone)]
    pub timezone: Tz,

    /// E-utilities base URL
    #[arg(long, env = "PUBMED_EUTILS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    /// Default log level for the `EnvFilter` when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Engine configuration for these arguments.
    #[must_use]
    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig::default()
            .with_base_url(self.base_url.clone())
            .with_max_results(self.max_results)
            .with_timezone(self.timezone)
    }
}

/// Progress bars render only to an interactive stderr, and not when
/// suppressed by `--quiet` or `--no-progress`.
#[must_use]
pub fn should_show_progress(stderr_is_terminal: bool, quiet: bool, no_progress: bool) -> bool {
    stderr_is_terminal && !quiet && !no_progress
}
