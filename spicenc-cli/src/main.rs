//! spicenc: downloads SPICE station positions into a CF/ACDD netCDF file.
use std::{path::PathBuf, time::Duration};

use clap::Parser;
use env_logger::Env;
use log::info;

use spicenc::prelude::{AggregationMode, Pipeline, Registry, Report, StationCode, TimeWindow};

mod error;
mod fetch;

use error::CliError;
use fetch::HttpSource;

const DEFAULT_ENDPOINT: &str = "https://publikacje.inoz.us.edu.pl/SPICE/metno.php";

#[derive(Debug, Parser)]
#[command(name = "spicenc", author, version)]
#[command(about = "Download SPICE station positions into a netCDF file", long_about = None)]
struct Cli {
    /// Station identifier, SPICE34 to SPICE38
    station: String,

    /// Window start, YYYY-MM-DDTHH:MM:SSZ
    start_ts: String,

    /// Window end, YYYY-MM-DDTHH:MM:SSZ
    end_ts: String,

    /// Output netCDF file. Replaced only once fully written.
    path: PathBuf,

    /// Coordinate written to the file: stable_reference (registry)
    /// or per_run_average (aggregate of the fetched samples)
    #[arg(long, default_value = "stable_reference")]
    mode: AggregationMode,

    /// Positioning service endpoint
    #[arg(long, env = "SPICENC_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout (s)
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Bearer token presented to the positioning service
    #[arg(long, env = "SPICENC_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

fn run(cli: Cli) -> Result<Report, CliError> {
    let station = cli.station.parse::<StationCode>()?;
    let window = TimeWindow::parse(&cli.start_ts, &cli.end_ts)?;

    let source = HttpSource::new(
        &cli.endpoint,
        cli.token,
        Duration::from_secs(cli.timeout),
    )?;

    info!("{} [{}] mode: {}", station, window, cli.mode);

    let report = Pipeline::new(Registry::builtin()?, source)
        .with_mode(cli.mode)
        .run(station, window, &cli.path)?;

    Ok(report)
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match run(cli) {
        Ok(report) => {
            println!(
                "{}: {} samples, ({:.5}, {:.5}) -> {}",
                report.station,
                report.sample_count,
                report.representative.latitude,
                report.representative.longitude,
                report.path.display(),
            );
        },
        Err(e) => e.exit(),
    }
}
