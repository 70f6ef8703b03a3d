//! Refresh the bundled IP range file from GeoLite2 Country CSV
//!
//! Run with: cargo run --bin update-geolite-data
//!
//! Needs MAXMIND_ACCOUNT_ID and MAXMIND_LICENSE_KEY in the environment
//! (a `.env` file in the working directory is picked up too).

use anyhow::{Context, Result};
use clap::Parser;
use geolite_ranges::config::{Credentials, UpdateConfig};
use geolite_ranges::fetch::{ArchiveSource, LocalArchive, MaxMindDownloader};
use geolite_ranges::pipeline::{run_update, today, UpdateSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "update-geolite-data")]
#[command(
    about = "Regenerate the CIDR-to-country range file from GeoLite2 Country CSV",
    long_about = "update-geolite-data - Download the GeoLite2 Country CSV archive from MaxMind, \
    resolve every IPv4 and IPv6 block to its ISO country code, and write a flat \
    CIDR,ISO_COUNTRY_CODE file.\n\n\
    Credentials are read from MAXMIND_ACCOUNT_ID and MAXMIND_LICENSE_KEY \
    (a .env file in the working directory is loaded first)."
)]
#[command(version)]
struct Cli {
    /// Destination file (replaced atomically)
    #[arg(short, long, value_name = "PATH", default_value = geolite_ranges::config::DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Process an already-downloaded archive instead of contacting MaxMind
    #[arg(long, value_name = "ZIP")]
    archive: Option<PathBuf>,

    /// Show per-family diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,reqwest=warn", default)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load `.env` from the working directory; a missing file is fine, a broken one is reported
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }
}

fn run(cli: &Cli) -> Result<UpdateSummary> {
    let config = UpdateConfig::new().with_output_path(&cli.output);

    let source: Box<dyn ArchiveSource> = match &cli.archive {
        Some(path) => Box::new(LocalArchive::new(path)),
        None => {
            let credentials = Credentials::from_env()?;
            Box::new(MaxMindDownloader::new(credentials, &config))
        }
    };

    let summary = run_update(source.as_ref(), config.output_path(), today())
        .with_context(|| format!("Failed to update {}", config.output_path().display()))?;
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    load_dotenv();

    match run(&cli) {
        Ok(summary) => {
            tracing::debug!(
                ipv4_skipped = summary.ipv4.skipped,
                ipv6_skipped = summary.ipv6.skipped,
                locations = summary.locations,
                "resolution summary"
            );
            println!(
                "✅ Successfully updated the geofence data file! ({} ranges written to {})",
                summary.entries,
                summary.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n--- ERROR ---");
            eprintln!("An error occurred: {:#}", e);
            eprintln!("Please check your environment variables and internet connection.");
            ExitCode::FAILURE
        }
    }
}
