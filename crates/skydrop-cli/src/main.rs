//! CLI tools for working with waypoint CSV files offline.
//!
//! Validates route files, normalizes them to canonical CSV, and runs the
//! mission simulator headless, printing one fix per line as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;

use skydrop_core::{
    csv, estimated_duration_min, path_distance_km, MissionSim, MissionStatus,
    DEFAULT_PLANNING_SPEED_KMH, DEFAULT_SIM_SPEED_MPS,
};

/// Skydrop mission planning tools
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a waypoint CSV file and print route statistics
    Validate {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Normalize a waypoint CSV file to canonical form on stdout
    Export {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Run the mission simulator over a CSV route, printing fixes as JSON lines
    Simulate {
        /// Path to the CSV file
        file: PathBuf,

        /// Simulated ground speed in m/s
        #[arg(long, default_value_t = DEFAULT_SIM_SPEED_MPS)]
        speed_mps: f64,

        /// Simulation step in milliseconds
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,

        /// Run in real time instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Export { file } => export(&file),
        Command::Simulate {
            file,
            speed_mps,
            tick_ms,
            realtime,
        } => simulate(&file, speed_mps, tick_ms, realtime).await,
    }
}

fn load_waypoints(file: &PathBuf) -> Result<Vec<skydrop_core::Waypoint>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let waypoints = csv::parse_waypoints(&text)
        .with_context(|| format!("{} is not a valid route file", file.display()))?;
    Ok(waypoints)
}

fn validate(file: &PathBuf) -> Result<()> {
    let waypoints = load_waypoints(file)?;
    let distance = path_distance_km(&waypoints);
    let duration = estimated_duration_min(distance, DEFAULT_PLANNING_SPEED_KMH);

    println!("Route OK: {}", file.display());
    println!("  Waypoints: {}", waypoints.len());
    println!("  Distance:  {:.2} km", distance);
    println!("  Est. time: {} min at {} km/h", duration, DEFAULT_PLANNING_SPEED_KMH);
    Ok(())
}

fn export(file: &PathBuf) -> Result<()> {
    let waypoints = load_waypoints(file)?;
    print!("{}", csv::export_waypoints(&waypoints));
    Ok(())
}

async fn simulate(file: &PathBuf, speed: f64, tick_ms: u64, realtime: bool) -> Result<()> {
    if speed <= 0.0 {
        bail!("speed must be positive");
    }
    if tick_ms == 0 {
        bail!("tick_ms must be positive");
    }

    let waypoints = load_waypoints(file)?;
    let mut sim = MissionSim::new(waypoints, speed);
    sim.start()?;

    let mut interval = time::interval(Duration::from_millis(tick_ms));
    loop {
        if realtime {
            interval.tick().await;
        }
        let fix = sim.tick(tick_ms as f64);
        println!("{}", serde_json::to_string(&fix)?);
        if fix.status == MissionStatus::Completed {
            break;
        }
    }
    Ok(())
}
