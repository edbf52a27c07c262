//! `lifelink-match` binary: run a donor match against a LifeLink database.
//!
//! # Usage
//!
//! ```bash
//! lifelink-match --db lifelink.db --patient-id 3f2a... --radius-km 20
//! lifelink-match --db lifelink.db --patient-id 3f2a... --name priya --blood-type O-
//! ```
//!
//! Ranked candidates are printed to stdout as the JSON array web clients
//! receive. Logs go to stderr and honour `RUST_LOG`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lifelink_core::config::{default_log_filter, MatchConfig};
use lifelink_core::{Database, MatchError, MatchQuery, Matcher};

/// Command-line arguments for the match binary.
#[derive(Parser, Debug)]
#[command(
    name = "lifelink-match",
    version,
    about = "Find and rank compatible blood donors for a patient",
    long_about = None
)]
struct Args {
    /// Path to the SQLite database.
    #[arg(long, value_name = "FILE")]
    db: PathBuf,

    /// Patient to match donors for.
    #[arg(long)]
    patient_id: String,

    /// Search radius in kilometres (clamped to the configured maximum).
    #[arg(long)]
    radius_km: Option<f64>,

    /// Only donors whose name contains this text (case-insensitive).
    #[arg(long)]
    name: Option<String>,

    /// Restrict results to one donor blood type, e.g. "O-".
    #[arg(long)]
    blood_type: Option<String>,

    /// JSON match configuration. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match args.config.as_deref() {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            MatchConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => MatchConfig::default(),
    };

    let db = Database::open(&args.db)
        .with_context(|| format!("opening database {}", args.db.display()))?;
    let matcher = Matcher::new(Arc::new(Mutex::new(db)), config);

    let mut query = MatchQuery::new(args.patient_id);
    query.radius_km = args.radius_km;
    query.name = args.name;
    query.blood_type = args.blood_type;

    let ranked = match matcher.find_match(&query).await {
        Ok(ranked) => ranked,
        Err(e) => return Err(describe(e)),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&ranked)?
    } else {
        serde_json::to_string(&ranked)?
    };
    println!("{}", json);
    Ok(())
}

/// Attach the transport status to a match failure.
fn describe(e: MatchError) -> anyhow::Error {
    let status = e.status_code();
    let retry = if e.is_retryable() { ", retryable" } else { "" };
    anyhow::Error::new(e).context(format!("match failed (status {}{})", status, retry))
}
