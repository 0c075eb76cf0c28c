//! Integrate the two-satellite scenario and print a summary.
//!
//! ```text
//! RUST_LOG=info cargo run --example two_satellites -- -c demos/two_satellites.yaml -o traj.csv
//! ```
use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};

use duosat::{config::SimulationConfig, DuoSatError};

#[derive(Debug, clap::Parser)]
#[command(name = "two_satellites", about = "Propagate two satellites around a central mass")]
pub struct Cli {
    /// YAML simulation configuration.
    #[arg(short = 'c', long = "config", default_value = "demos/two_satellites.yaml")]
    pub config: Utf8PathBuf,

    /// Write the trajectory table to this CSV file.
    #[arg(short = 'o', long = "output")]
    pub output: Option<Utf8PathBuf>,
}

fn main() -> Result<(), DuoSatError> {
    env_logger::init();
    let args = Cli::parse();

    let sim = SimulationConfig::from_path(&args.config)?.build()?;
    info!("{sim}");

    let result = sim.run()?;
    let trajectory = &result.trajectory;
    let last = trajectory.satellite_states().last();

    println!("{:#}", result.stats);
    println!("samples            : {}", trajectory.len());
    println!("end time           : {} s", trajectory.end_time());
    let (r1, r2) = trajectory.max_radii();
    println!("max radius body 1  : {r1:.1} km");
    println!("max radius body 2  : {r2:.1} km");
    println!("min separation     : {:.1} km", trajectory.min_separation());

    if let Some((t, state)) = last {
        println!("\nFinal state at t = {t} s\n{state}");

        let dynamics = sim.dynamics();
        let initial = sim.initial_state();
        let drift = (dynamics.total_energy(&state) - dynamics.total_energy(initial))
            / dynamics.total_energy(initial).abs();
        println!("relative energy drift: {drift:.3e}");

        match sim.osculating_elements(t, &state) {
            Ok((el1, el2)) => println!("\nBody 1\n{el1}\n\nBody 2\n{el2}"),
            Err(e) => warn!("No osculating elements at t = {t}: {e}"),
        }
    }

    if let Some(path) = &args.output {
        trajectory.write_csv_file(path)?;
        info!("Trajectory written to {path}");
    }

    Ok(())
}
