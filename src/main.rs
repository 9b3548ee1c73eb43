//! CLI entry point for the bike-share station traffic tool.
//!
//! Loads the station and trip feeds, then reports per-station departures and
//! arrivals for a time-of-day window, or sweeps the window across the day.

use anyhow::{Result, ensure};
use bikeshare_traffic::{
    buckets::MINUTES_PER_DAY,
    config::FeedConfig,
    fetch::BasicClient,
    output::{append_records, print_json, print_pretty, records, write_records},
    session::TrafficSession,
    window::TimeFilter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_traffic")]
#[command(about = "Per-station bike-share traffic by time of day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FeedArgs {
    /// Station feed URL or path [env: STATIONS_SOURCE]
    #[arg(long, value_name = "FILE_OR_URL")]
    stations: Option<String>,

    /// Trip feed URL or path, optionally gzipped [env: TRIPS_SOURCE]
    #[arg(long, value_name = "FILE_OR_URL")]
    trips: Option<String>,
}

impl FeedArgs {
    fn into_config(self) -> FeedConfig {
        FeedConfig::resolve(self.stations, self.trips)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Show station traffic for one time filter
    Stations {
        /// Centre of the ±60 minute window: HH:MM, minute of day, or "any"
        #[arg(short, long, default_value = "any")]
        time: TimeFilter,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// CSV file to write (csv format only)
        #[arg(short, long, default_value = "stations.csv")]
        output: String,

        #[command(flatten)]
        feeds: FeedArgs,
    },
    /// Step the window across the whole day and append every pass to a CSV
    Sweep {
        /// Minutes between window centres
        #[arg(short, long, default_value_t = 60)]
        step: usize,

        /// CSV file to append results to
        #[arg(short, long, default_value = "sweep.csv")]
        output: String,

        #[command(flatten)]
        feeds: FeedArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> WorkerGuard {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

async fn run(command: Commands) -> Result<()> {
    let client = BasicClient::new();

    match command {
        Commands::Stations {
            time,
            format,
            output,
            feeds,
        } => {
            let config = feeds.into_config();
            let mut session = TrafficSession::load(&client, &config).await?;
            let stations = session.set_filter(time);

            match format {
                OutputFormat::Pretty => print_pretty(stations, time),
                OutputFormat::Json => print_json(stations)?,
                OutputFormat::Csv => {
                    write_records(&output, &records(stations, time))?;
                    info!(output = %output, rows = stations.len(), "Station traffic written");
                }
            }
        }
        Commands::Sweep {
            step,
            output,
            feeds,
        } => {
            ensure!(
                (1..=MINUTES_PER_DAY).contains(&step),
                "step must be between 1 and {} minutes",
                MINUTES_PER_DAY
            );

            let config = feeds.into_config();
            let mut session = TrafficSession::load(&client, &config).await?;
            info!(trips = session.trip_count(), step, "Starting day sweep");

            for minute in (0..MINUTES_PER_DAY).step_by(step) {
                let filter = TimeFilter::at_minute(minute)?;
                session.set_filter(filter);
                let stations = session.stations();
                append_records(&output, &records(stations, filter))?;

                let busiest = stations.iter().max_by_key(|s| s.total_traffic());
                info!(
                    time = %filter,
                    departures = session.filtered_departures().len(),
                    arrivals = session.filtered_arrivals().len(),
                    busiest = busiest.map(|s| s.short_name()).unwrap_or(""),
                    "Window processed"
                );
            }

            info!(output = %output, "Finished day sweep");
        }
    }

    Ok(())
}
