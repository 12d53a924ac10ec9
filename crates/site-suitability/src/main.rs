//! Site Suitability Scoring CLI
//!
//! Calibrates the empirical weights from reference station outcomes, then
//! scores candidate coordinates, interpolates expected success, or sweeps a
//! whole grid for expansion planning.
//!
//! Usage:
//!   score-sites calibrate --stations data/reference_stations.json
//!   score-sites score --lat 47.6 --lon -122.3 --antenna-m 13.2
//!   score-sites interpolate --lat 47.6 --lon -122.3 --power 2
//!   score-sites grid --lat-min 30 --lat-max 60 --lon-min -10 --lon-max 30

use anyhow::Result;
use clap::{Parser, Subcommand};
use orbital_visibility::walker::{WalkerShell, WalkerVisibilityModel};
use site_suitability::{
    loader,
    report::{self, GridSpec},
    CalibrationConfig, CalibrationResult, FeatureCategory, IdwParams, PointOverrides,
    SuitabilityModel, CALIBRATION_ITERATIONS, LEARNING_RATE,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "score-sites",
    about = "Empirical site suitability scoring for SX9-Orbital ground station expansion"
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate category weights from reference station outcomes
    Calibrate(CalibrateArgs),
    /// Score one coordinate with the calibrated model
    Score(ScoreArgs),
    /// Interpolate expected success from nearby stations
    Interpolate(InterpolateArgs),
    /// Score a lat/lon grid and export GeoJSON
    Grid(GridArgs),
}

#[derive(Parser, Debug)]
struct CalibrateArgs {
    /// Path to reference stations JSON file
    #[arg(short, long, default_value = "data/reference_stations.json")]
    stations: PathBuf,

    /// Output JSON file for the calibration result
    #[arg(short, long, default_value = "data/calibration_result.json")]
    output: PathBuf,

    /// Gradient descent sweeps
    #[arg(long, default_value_t = CALIBRATION_ITERATIONS)]
    iterations: usize,

    /// Gradient descent step size
    #[arg(long, default_value_t = LEARNING_RATE)]
    learning_rate: f64,

    /// Skip the orbital simulation and use latitude estimates
    #[arg(long)]
    estimates_only: bool,

    /// Train on the ROI-only fallback set
    #[arg(long)]
    degraded: bool,
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    /// Path to reference stations JSON file
    #[arg(short, long, default_value = "data/reference_stations.json")]
    stations: PathBuf,

    /// Candidate latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Candidate longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Planned antenna diameter in meters
    #[arg(long)]
    antenna_m: Option<f64>,

    /// Planned G/T in dB/K
    #[arg(long)]
    g_t_db: Option<f64>,

    /// Expected monthly revenue in USD
    #[arg(long)]
    revenue_usd: Option<f64>,

    /// Expected customer count
    #[arg(long)]
    customers: Option<u32>,

    /// Country code or name for the infrastructure lookup
    #[arg(long)]
    country: Option<String>,

    /// Skip the orbital simulation and use latitude estimates
    #[arg(long)]
    estimates_only: bool,
}

#[derive(Parser, Debug)]
struct InterpolateArgs {
    /// Path to reference stations JSON file
    #[arg(short, long, default_value = "data/reference_stations.json")]
    stations: PathBuf,

    /// Query latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Query longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Inverse distance exponent
    #[arg(long, default_value_t = 2.0)]
    power: f64,

    /// Neighbor search radius in km
    #[arg(long, default_value_t = 5000.0)]
    max_distance_km: f64,

    /// Skip the orbital simulation and use latitude estimates
    #[arg(long)]
    estimates_only: bool,
}

#[derive(Parser, Debug)]
struct GridArgs {
    /// Path to reference stations JSON file
    #[arg(short, long, default_value = "data/reference_stations.json")]
    stations: PathBuf,

    /// Output GeoJSON file
    #[arg(short, long, default_value = "data/suitability_grid.geojson")]
    output: PathBuf,

    #[arg(long, default_value_t = -60.0, allow_hyphen_values = true)]
    lat_min: f64,

    #[arg(long, default_value_t = 60.0, allow_hyphen_values = true)]
    lat_max: f64,

    #[arg(long, default_value_t = -180.0, allow_hyphen_values = true)]
    lon_min: f64,

    #[arg(long, default_value_t = 180.0, allow_hyphen_values = true)]
    lon_max: f64,

    /// Grid spacing in degrees
    #[arg(long, default_value_t = 10.0)]
    step_deg: f64,

    /// Skip the orbital simulation and use latitude estimates
    #[arg(long)]
    estimates_only: bool,
}

/// Load stations, attach the Walker visibility model unless estimates were
/// requested, and calibrate.
async fn calibrated_model(
    stations_path: &Path,
    config: CalibrationConfig,
    estimates_only: bool,
    degraded: bool,
) -> Result<(SuitabilityModel, CalibrationResult)> {
    let stations = loader::load_reference_stations(stations_path)?;
    info!("Calibrating against {} reference stations", stations.len());

    let mut model = SuitabilityModel::new(stations).with_config(config);
    if !estimates_only {
        let walker = WalkerVisibilityModel::new(WalkerShell::halo());
        model = model.with_calculator(Arc::new(walker));
    }

    let result = if degraded {
        model.calibrate_degraded().await?
    } else {
        model.calibrate_weights().await?
    };

    Ok((model, result))
}

fn print_calibration_summary(result: &CalibrationResult) {
    info!("\nCalibrated category weights:");
    for cat in FeatureCategory::ALL {
        info!("  {:16} {:.4}", cat.name(), result.weights.get(cat));
    }

    info!("\nValidation:");
    info!("  accuracy:    {:.2}", result.accuracy);
    info!("  rmse:        {:.3}", result.rmse);
    info!("  correlation: {:.3}", result.correlation_coefficient);

    info!("\nPredicted vs actual success:");
    let report = &result.validation;
    for (i, name) in report.station_names.iter().enumerate().take(10) {
        info!(
            "  {:6.2} vs {:6.2} | {}",
            report.predicted[i], report.actual[i], name
        );
    }
}

fn overrides_from_score_args(args: &ScoreArgs) -> Option<PointOverrides> {
    if args.antenna_m.is_none()
        && args.g_t_db.is_none()
        && args.revenue_usd.is_none()
        && args.customers.is_none()
        && args.country.is_none()
    {
        return None;
    }
    Some(PointOverrides {
        antenna_size_m: args.antenna_m,
        g_t_db: args.g_t_db,
        expected_monthly_revenue_usd: args.revenue_usd,
        expected_customer_count: args.customers,
        country: args.country.clone(),
    })
}

async fn run_calibrate(args: CalibrateArgs) -> Result<()> {
    let config = CalibrationConfig {
        iterations: args.iterations,
        learning_rate: args.learning_rate,
    };
    let (_, result) = calibrated_model(&args.stations, config, args.estimates_only, args.degraded).await?;

    print_calibration_summary(&result);

    info!("\nWriting calibration result to {:?}", args.output);
    let file = File::create(&args.output)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &result)?;

    Ok(())
}

async fn run_score(args: ScoreArgs) -> Result<()> {
    let (model, result) = calibrated_model(
        &args.stations,
        CalibrationConfig::default(),
        args.estimates_only,
        false,
    )
    .await?;

    let overrides = overrides_from_score_args(&args);
    let scored = model.score_location(args.lat, args.lon, overrides.as_ref())?;

    info!("\n{}", "=".repeat(60));
    info!("SCORE");
    info!("{}", "=".repeat(60));
    info!("Location:    ({:.4}, {:.4})", scored.latitude, scored.longitude);
    info!("Score:       {:.2} / 100", scored.score);
    info!("Confidence:  {:.3}", scored.confidence);
    info!(
        "Nearest:     {} ({:.0} km)",
        scored.nearest_stations.first().map(String::as_str).unwrap_or("none"),
        scored.nearest_distance_km
    );
    info!("Model accuracy at calibration: {:.2}", result.accuracy);

    println!("{}", serde_json::to_string_pretty(&scored)?);
    Ok(())
}

async fn run_interpolate(args: InterpolateArgs) -> Result<()> {
    let (model, _) = calibrated_model(
        &args.stations,
        CalibrationConfig::default(),
        args.estimates_only,
        false,
    )
    .await?;

    let params = IdwParams {
        power: args.power,
        max_distance_km: args.max_distance_km,
    };
    let estimate = model.interpolate_idw(args.lat, args.lon, params)?;

    info!(
        "Interpolated success {:.2} (confidence {:.3}) from {} stations",
        estimate.value,
        estimate.confidence,
        estimate.source_stations.len()
    );

    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

async fn run_grid(args: GridArgs) -> Result<()> {
    let (model, _) = calibrated_model(
        &args.stations,
        CalibrationConfig::default(),
        args.estimates_only,
        false,
    )
    .await?;

    let spec = GridSpec {
        lat_min: args.lat_min,
        lat_max: args.lat_max,
        lon_min: args.lon_min,
        lon_max: args.lon_max,
        step_deg: args.step_deg,
    };
    let scores = report::score_grid(&model, &spec, None)?;

    // Best cell first in the log, full set in the file
    if let Some(best) = scores
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
    {
        info!(
            "Best cell: ({:.2}, {:.2}) score {:.2}",
            best.latitude, best.longitude, best.score
        );
    }

    info!("Writing GeoJSON to {:?}", args.output);
    let geojson = report::grid_to_geojson(&scores, &spec);
    let file = File::create(&args.output)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &geojson)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("SX9-Orbital Site Suitability Scorer");
    info!("{}", "=".repeat(60));

    match cli.command {
        Command::Calibrate(args) => run_calibrate(args).await,
        Command::Score(args) => run_score(args).await,
        Command::Interpolate(args) => run_interpolate(args).await,
        Command::Grid(args) => run_grid(args).await,
    }
}
