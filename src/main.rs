//! SatAccess command line driver
//!
//! Loads the scenario settings, runs the simulation and writes the Sun
//! angle, Earth angle and access time CSV files.

use std::path::PathBuf;
use std::time::Instant as WallClock;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use sataccess::output::CsvSink;
use sataccess::propagation::{OrbitPropagator, PropagatorModel};
use sataccess::{ScenarioConfig, Settings, Simulation};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Sun/Earth angles and ground station access windows")]
struct Cli {
    /// Settings file (JSON); written with defaults when missing
    #[arg(long, default_value = "set.json")]
    settings: PathBuf,
    /// Override the results directory
    #[arg(long)]
    results_dir: Option<PathBuf>,
    /// Override the propagator model (keplerian or zonal)
    #[arg(long)]
    model: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let started = WallClock::now();

    log::info!("Starting SatAccess...");

    let mut settings = Settings::load_or_default(&cli.settings);
    if let Some(dir) = &cli.results_dir {
        settings.set("ResultsDirectory", dir.display().to_string());
    }
    if let Some(model) = &cli.model {
        settings.set("PropagatorModel", model.as_str());
    }

    let config = ScenarioConfig::from_provider(&settings).context("Invalid scenario settings")?;
    log::info!(
        "Satellite {}: a = {:.1} km, i = {:.4} deg, station at {:.6}, {:.6}",
        config.satellite_name,
        config.elements.semi_major_axis() / 1000.0,
        config.elements.inclination().to_degrees(),
        config.station.latitude(),
        config.station.longitude()
    );
    log::debug!(
        "Available models: {}",
        PropagatorModel::all()
            .iter()
            .map(|m| format!("{} ({})", m.key(), m.description()))
            .collect::<Vec<_>>()
            .join("; ")
    );

    let simulation = Simulation::new(&config).context("Failed to set up the simulation")?;
    log::info!("Propagator ready: {}", simulation.propagator().name());

    let mut sink = CsvSink::create(&config.outputs).context("Failed to open result files")?;

    let progress = ProgressBar::new(simulation.steps() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{elapsed_precise} {bar:40.cyan/blue} {pos}/{len} {percent}% ETA {eta_precise}",
        )
        .context("Invalid progress bar template")?
        .progress_chars("##-"),
    );

    let summary = simulation
        .run(&mut sink, &mut |done: usize, _: usize| progress.set_position(done as u64))
        .context("Simulation failed")?;
    progress.finish_and_clear();

    sink.flush().context("Failed to flush result files")?;

    if let Some(begin) = summary.open_window {
        log::info!(
            "An access window opened at {} was still open at the end and is not listed",
            sataccess::time::format_utcg(&begin)
        );
    }
    if summary.sink_errors > 0 {
        log::warn!("{} rows could not be written", summary.sink_errors);
    }

    log::info!(
        "Done: {} steps, {} access windows, results in {:?} ({:.2} s)",
        summary.steps,
        summary.windows,
        config.outputs.directory,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
