//! Carbon-aware refrigerator simulation
//!
//! Run with: `cargo run --bin fridge-sim`
//!
//! Set `RUST_LOG` to control log output, e.g. `RUST_LOG=fridge_sim=debug`.
//! See `fridge_sim::config` for the `MOER_*` variables.

use fridge_sim::{write_chart_csv, DatasetFetcher, Simulation, SimulationConfig};
use std::fs::File;
use std::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = SimulationConfig::from_env()?;

    let fetcher = DatasetFetcher::new(config.dataset.clone())?;
    let path = fetcher.ensure_dataset().await?;
    tracing::info!("Dataset ready at {}", path.display());

    let reader = BufReader::new(File::open(&path)?);
    let mut simulation = Simulation::new(config.refrigerator.clone())?;
    let run = simulation.run_csv(reader, config.window.clone());

    println!("{}", run);
    match run.summary() {
        Some(summary) => println!("{}", summary),
        None => println!("No MOERs in the selected range"),
    }

    if let Some(chart_path) = &config.chart_output {
        write_chart_csv(&run.history, File::create(chart_path)?)?;
        tracing::info!("Chart series written to {}", chart_path.display());
    }

    if let Some(err) = run.error {
        tracing::error!("Simulation failed: {}", err);
        return Err(err.into());
    }

    Ok(())
}
