//! brdc-feeder: keeps a GPS simulator fed with daily broadcast ephemerides.
//!
//! Each run:
//! - on the first start, sets up Earthdata credentials and builds gps-sdr-sim
//! - once a day, downloads the newest broadcast ephemeris from CDDIS and
//!   regenerates the baseband signal with gps-sdr-sim
//! - transmits the signal file with hackrf_transfer
//!
//! Meant to be started periodically by cron or a similar scheduler.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use brdc_core::config::{load_params, Params};
use brdc_core::netrc::Platform;
use brdc_core::schedule::{default_target_date, parse_date, update_due};
use brdc_core::types::{BrdcError, Result};
use brdc_core::url::build_url;

mod credentials;
mod ephemeris;
mod fetch;
mod invoke;
mod prompt;
mod update;

use fetch::HttpSource;
use invoke::SystemRunner;
use prompt::TerminalPrompter;
use update::{Feeder, UpdateOutcome};

#[derive(Parser)]
#[command(
    name = "brdc-feeder",
    version,
    about = "Daily GPS broadcast ephemeris refresh for gps-sdr-sim and hackrf_transfer"
)]
struct Cli {
    /// Directory with params.ini, gps-sdr-sim and the ephemeris files
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Params file, relative to the work directory
    #[arg(long, default_value = brdc_core::PARAMS_FILE)]
    params: PathBuf,

    /// Log filter (e.g. "info", "brdc_feeder=debug")
    #[arg(long, env = "BRDC_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the ephemeris if due, then run the simulator and transmitter (default)
    Run,

    /// Print the archive URL of the ephemeris file for a date
    Url {
        /// Date as YYYY-MM-DD, defaults to yesterday
        #[arg(long)]
        date: Option<String>,
    },

    /// Print the persisted state as JSON
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let now = Local::now().naive_local();
    let params_path = cli.work_dir.join(&cli.params);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(&cli.work_dir, &params_path, now).await,
        Commands::Url { date } => cmd_url(&params_path, date.as_deref(), now),
        Commands::Status => cmd_status(&params_path, now),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn cmd_run(work_dir: &Path, params_path: &Path, now: NaiveDateTime) -> Result<()> {
    let work_dir = std::fs::canonicalize(work_dir)?;
    let params = load_params(params_path)?;

    let platform = Platform::current();
    let home = credentials::home_dir();
    let netrc_path = platform.zip(home.as_deref()).map(|(p, h)| p.credential_path(h));
    let source = HttpSource::new(netrc_path, &params.archive.credential_host)?;

    let mut prompter = TerminalPrompter;
    let mut runner = SystemRunner;
    let mut feeder = Feeder {
        work_dir,
        params_path: params_path.to_path_buf(),
        home,
        platform,
        source: &source,
        prompter: &mut prompter,
        runner: &mut runner,
    };

    let (_, report) = feeder.run(params, now).await?;
    let ephemeris = match &report.update {
        UpdateOutcome::Updated(path) => path.display().to_string(),
        UpdateOutcome::NotDue => "unchanged".to_string(),
        UpdateOutcome::FetchFailed => "stale".to_string(),
    };
    info!(
        built = report.built,
        simulated = report.simulated,
        transmitted = report.transmitted,
        %ephemeris,
        "run complete"
    );
    Ok(())
}

fn cmd_url(params_path: &Path, date: Option<&str>, now: NaiveDateTime) -> Result<()> {
    let params = load_params(params_path)?;
    let date = match date {
        Some(d) => parse_date(d)?,
        None => default_target_date(now),
    };
    println!("{}", build_url(&params.archive.url, date));
    Ok(())
}

fn cmd_status(params_path: &Path, now: NaiveDateTime) -> Result<()> {
    let params = load_params(params_path)?;
    println!("{}", status_json(&params, now)?);
    Ok(())
}

fn status_json(params: &Params, now: NaiveDateTime) -> Result<String> {
    let due = params.first_start || update_due(params.update.last_date, now);
    let status = serde_json::json!({
        "params": params,
        "update_due": due,
    });
    serde_json::to_string_pretty(&status).map_err(|e| BrdcError::Config(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
