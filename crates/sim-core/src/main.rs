//! Precarity Simulation Engine
//!
//! Runs the turn loop from the command line and prints a per-turn summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use sim_core::config::SimConfig;
use sim_core::output::telemetry::{JsonlTelemetrySink, TelemetrySink};
use sim_core::simulation::{bootstrap, build_provider, open_store, Simulation, TickReport};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "precarity_sim")]
#[command(about = "A turn-based simulation of economic precarity")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation for a number of turns
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Number of turns to simulate
    #[arg(long, default_value_t = 10)]
    turns: u64,

    /// Ask the inference service for decisions
    #[arg(long)]
    use_inference: bool,

    /// Clear the store and reseed the world
    #[arg(long)]
    reset: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the JSON store
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

/// `RUST_LOG` directives (or `info`), with `--verbose` raising the floor to debug.
fn log_filter(verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    let filter = env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let below_debug = filter.max_level_hint().map_or(true, |level| level < LevelFilter::DEBUG);
    if verbose && below_debug {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_tracing(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(verbose, env.as_deref());
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(args: &RunArgs) -> Result<SimConfig, sim_core::ConfigError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(dir) = &args.state_dir {
        config.store.directory = dir.clone();
    }
    if args.use_inference {
        config.inference.enabled = true;
    }
    Ok(config)
}

fn print_turn(report: &TickReport) {
    println!(
        "[Turn {:>3}] Day {} {} - {} actions, {} encounters, {} skipped",
        report.turn,
        report.clock.day(),
        report.clock.stamp(),
        report.turns.len(),
        report.encounters.len(),
        report.skipped.len()
    );
    for turn in &report.turns {
        let r = &turn.resolution;
        println!(
            "  {:<22} {:<32} ${} -> ${}  {}",
            r.agent_id, r.action, r.money_before, r.money_after, r.summary
        );
    }
    for encounter in &report.encounters {
        println!(
            "  * {} and {} at {}: {}",
            encounter.participants.0, encounter.participants.1, encounter.location, encounter.summary
        );
    }
}

fn run(args: RunArgs) -> ExitCode {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Precarity Simulation");
    println!("====================");
    println!("Seed: {}", config.simulation.seed);
    println!("Turns: {}", args.turns);
    println!();

    let mut store = open_store(&config.store);
    let state = match bootstrap(&config.simulation, store.as_mut(), args.reset) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Store unreachable at startup: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider = match build_provider(&config, args.use_inference) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let telemetry: Box<dyn TelemetrySink> = match &config.telemetry.path {
        Some(path) => match JsonlTelemetrySink::new(path) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                tracing::warn!("Telemetry disabled, could not open {}: {}", path.display(), e);
                Box::new(JsonlTelemetrySink::null())
            }
        },
        None => Box::new(JsonlTelemetrySink::null()),
    };

    let mut sim = Simulation::new(state, config.simulation.clone())
        .with_provider(provider)
        .with_store(store)
        .with_telemetry(telemetry);
    tracing::info!(
        "Starting at turn {} with {} agents, decisions by {}",
        sim.state().world.turn(),
        sim.state().agents.len(),
        sim.provider_name()
    );

    let mut fallbacks = 0;
    for _ in 0..args.turns {
        let report = sim.tick();
        fallbacks += report.fallback_count();
        print_turn(&report);
    }

    println!();
    println!(
        "Simulation complete. Ran {} turns, world now at turn {} ({}); {} fallback decisions.",
        args.turns,
        sim.state().world.turn(),
        sim.state().world.clock.stamp(),
        fallbacks
    );
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => {
            init_tracing(args.verbose);
            run(args)
        }
    }
}
