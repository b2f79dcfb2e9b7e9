//! Primate Troop Simulation
//!
//! Headless runner: loads tuning, runs a seeded world for a number of ticks
//! and logs periodic strategy summaries.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use troop_core::config::DEFAULT_TUNING_PATH;
use troop_core::{SimConfig, Simulation, SimulationError};
use troop_events::{EventKind, SimEvent};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "troop_sim")]
#[command(about = "Primate agent behaviour and social-learning simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate (defaults to simulation.default_ticks)
    #[arg(long)]
    ticks: Option<u64>,

    /// Tuning file; a missing tuning.toml in the working directory falls back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks between summaries (defaults to simulation.stats_interval)
    #[arg(long)]
    stats_interval: Option<u64>,

    /// Print the final world state as JSON to stdout
    #[arg(long)]
    output_final_state: bool,
}

/// Event counts between two summaries
#[derive(Debug, Default)]
struct EventTally {
    meals: usize,
    strikes: usize,
    lessons: usize,
    deaths: usize,
}

impl EventTally {
    fn record(&mut self, events: &[SimEvent]) {
        for event in events {
            match event.kind {
                EventKind::Meal { .. } => self.meals += 1,
                EventKind::Strike { .. } => self.strikes += 1,
                EventKind::Lesson { .. } => self.lessons += 1,
                EventKind::Death { .. } => self.deaths += 1,
                EventKind::StateChange { .. } => {}
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimConfig, SimulationError> {
    match path {
        Some(path) => Ok(SimConfig::load(path)?),
        None if Path::new(DEFAULT_TUNING_PATH).exists() => Ok(SimConfig::load(DEFAULT_TUNING_PATH)?),
        None => {
            tracing::info!("No {} found, using built-in defaults", DEFAULT_TUNING_PATH);
            Ok(SimConfig::default())
        }
    }
}

fn log_summary(sim: &Simulation, tally: &EventTally) {
    let stats = sim.statistics();
    tracing::info!(
        "[Tick {:>5}] population {} | meals {} strikes {} lessons {} deaths {}",
        stats.tick,
        stats.total_population(),
        tally.meals,
        tally.strikes,
        tally.lessons,
        tally.deaths
    );
    for (species, summary) in &stats.species {
        let dominant = |context: &str| {
            summary
                .dominant(context)
                .map(|(name, weight)| format!("{} {:.2}", name, weight))
                .unwrap_or_else(|| "-".to_string())
        };
        tracing::info!(
            "    {:<8} n={:<3} threshold {:.2} | foraging {} | combat {} | flee {}",
            species,
            summary.population,
            summary.mean_hunger_threshold,
            dominant("foraging"),
            dominant("combat"),
            dominant("flee")
        );
    }
}

fn run(args: Args) -> Result<(), SimulationError> {
    let config = load_config(args.config.as_deref())?;
    let ticks = args.ticks.unwrap_or(config.simulation.default_ticks);
    let stats_interval = args.stats_interval.unwrap_or(config.simulation.stats_interval);

    tracing::info!("Primate Troop Simulation");
    tracing::info!("Seed: {}, ticks: {}, stats interval: {}", args.seed, ticks, stats_interval);

    let mut sim = Simulation::new(config, args.seed)?;
    let mut tally = EventTally::default();
    log_summary(&sim, &tally);

    for _ in 0..ticks {
        sim.step();
        tally.record(&sim.drain_events());

        if stats_interval > 0 && sim.tick() % stats_interval == 0 {
            log_summary(&sim, &tally);
            tally = EventTally::default();
        }
        if sim.population() == 0 {
            tracing::info!("All agents died at tick {}", sim.tick());
            break;
        }
    }

    tracing::info!("Simulation complete after {} ticks", sim.tick());

    if args.output_final_state {
        match sim.snapshot().to_json_pretty() {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Could not serialize final state: {}", e),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
