mod config;
mod echo;
mod mission;
mod orbit;
mod pulse;
mod swath;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::MissionConfig;
use crate::mission::{EchoDispatcher, Mission, MissionError, PositionLogger, TickLoop};

#[derive(Parser)]
#[command(name = "sar-o-mat")]
#[command(about = "Real-time SAR mission simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mission config and print the derived footprint
    Validate { config: String },
    /// Track headlessly for a fixed duration
    Run {
        config: String,
        /// How long to track, e.g. "60s" or "5m"
        #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
        duration: std::time::Duration,
    },
    /// Track and expose the HTTP control API
    Serve { config: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config, duration } => run(&config, duration).await,
        Commands::Serve { config } => serve(&config).await,
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match MissionConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let now = chrono::Utc::now();
    let propagator = match config.build_propagator(now) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Orbit error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Config is valid ({})", propagator.describe());
    println!(
        "  batch: {} pulses / {:.6} s at PRF {} Hz",
        config.batch_size(),
        config.batch_time_s(),
        config.radar.prf
    );

    let heading = orbit::HeadingCalculator::new(config.tracking.heading_offset_deg);
    match (propagator.propagate(now), heading.heading(&propagator, now)) {
        (Ok(state), Ok(heading_deg)) => {
            let p = state.position;
            println!(
                "  position: lon {:.4} lat {:.4} alt {:.0} m, heading {:.2}",
                p.longitude_deg, p.latitude_deg, p.altitude_m, heading_deg
            );
            let geometry = config.tracking.swath.geometry_at(
                p.latitude_deg,
                p.longitude_deg,
                heading_deg,
                Some(p.altitude_m),
            );
            for (i, c) in swath::corners(&geometry).iter().enumerate() {
                println!("  corner {}: lon {:.4} lat {:.4}", i + 1, c.lon_deg, c.lat_deg);
            }
        }
        (Err(e), _) | (_, Err(e)) => println!("  no position available now: {}", e),
    }
    ExitCode::SUCCESS
}

fn build_mission(config: &MissionConfig) -> Result<Arc<Mutex<Mission>>, MissionError> {
    let mut mission = Mission::from_config(config, chrono::Utc::now())?;

    mission
        .observers_mut()
        .subscribe_position(Box::new(PositionLogger::new(100)));

    match &config.echo {
        Some(echo) => {
            let dispatcher = EchoDispatcher::new(echo, config.radar.clone())?;
            mission.observers_mut().subscribe_batch(Box::new(dispatcher));
            log::info!("Dispatching batches to {}", echo.url);
        }
        None => log::warn!("No echo service configured, batches are only logged"),
    }

    Ok(Arc::new(Mutex::new(mission)))
}

fn prepare(path: &str) -> Result<(MissionConfig, Arc<Mutex<Mission>>), MissionError> {
    let config = MissionConfig::from_file(path)?;
    let mission = build_mission(&config)?;
    Ok((config, mission))
}

async fn run(path: &str, duration: std::time::Duration) -> ExitCode {
    let (config, mission) = match prepare(path) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    mission.lock().await.start_tracking(chrono::Utc::now());
    let ticks = TickLoop::spawn(mission.clone(), config.tracking.tick_interval);

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted"),
    }

    let count = ticks.stop().await;
    let mut locked = mission.lock().await;
    locked.stop_tracking();
    let snapshot = locked.snapshot();
    println!(
        "Tracked for {} ticks: {} batches, {} skipped ticks",
        count, snapshot.batches_emitted, snapshot.skipped_ticks
    );
    ExitCode::SUCCESS
}

async fn serve(path: &str) -> ExitCode {
    let (config, mission) = match prepare(path) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ticks = TickLoop::spawn(mission.clone(), config.tracking.tick_interval);
    let result = web::run_server(&config.web.bind, mission).await;
    ticks.stop().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
