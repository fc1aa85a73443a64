use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use log::{debug, info};
use cpilib::config::{AddressPatternConfig, SeedConfig, SimulationConfig};
use cpilib::rng::PseudoRandomStream;
use cpilib::simulator::Simulator;
use cpilib::util::{run_sweep, PatternResult};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Estimates CPI for synthetic address streams on a two-level cache hierarchy"))]
struct Args {
    /// JSON simulation config, every field optional
    #[arg(short, long)]
    config: Option<String>,

    /// Address pattern, e.g. sequential, random:24k, strided:32:1m or trace:<path>. Repeatable
    #[arg(long = "pattern")]
    patterns: Vec<AddressPatternConfig>,

    /// L1 line size in bytes. Repeatable
    #[arg(short, long = "line-size")]
    line_sizes: Vec<u64>,

    #[arg(short, long)]
    iterations: Option<u64>,

    /// Seed words for the random stream, as w,z
    #[arg(short, long, value_parser = parse_seed, conflicts_with = "time_seed")]
    seed: Option<SeedConfig>,

    /// Seed the random stream from the clock, runs will not be reproducible
    #[arg(short, long)]
    time_seed: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn parse_seed(s: &str) -> Result<SeedConfig, String> {
    let (w, z) = s.split_once(',').ok_or_else(|| format!("Expected a seed of the form w,z, got {s}"))?;
    let parse = |word: &str| word.trim().parse::<u32>().map_err(|e| format!("Invalid seed word {word}: {e}"));
    Ok(SeedConfig { w: parse(w)?, z: parse(z)? })
}

fn load_config(args: &Args) -> Result<SimulationConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            SimulationConfig::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?
        }
        None => SimulationConfig::default(),
    };
    if !args.patterns.is_empty() {
        config.patterns = args.patterns.clone();
    }
    if !args.line_sizes.is_empty() {
        config.line_sizes = args.line_sizes.clone();
    }
    if let Some(iterations) = args.iterations {
        config.driver.iterations = iterations;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = load_config(&args)?;
    debug!("Parsed input configuration: {config:?}");
    let mut simulator = Simulator::from_config(&config);
    if args.time_seed {
        *simulator.rng_mut() = PseudoRandomStream::from_time();
    }
    let (w, z) = simulator.rng().state();
    info!(
        "Simulating {} patterns x {} line sizes, {} instructions each, seed {w},{z}",
        config.patterns.len(), config.line_sizes.len(), config.driver.iterations
    );

    let results = run_sweep(&mut simulator, &config).map_err(|e| format!("Simulation failed: {e}"))?;
    println!("{}", serde_json::to_string_pretty(&results).map_err(|e| format!("Couldn't serialise the output {e}"))?);

    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        print_uninitialised_line_counts(&results);
    }
    Ok(())
}

/// Prints how many lines each level never filled, per pattern and line size
fn print_uninitialised_line_counts(results: &[PatternResult]) {
    for result in results {
        for report in &result.results {
            let formatted = report.caches
                .iter()
                .map(|c| format!("{}: {}", c.name, c.uninitialised_lines))
                .reduce(|a, b| format!("{a}, {b}"))
                .unwrap_or_default();
            println!("Uninitialised cache lines for {} at {}B: ({formatted})", result.pattern, report.l1_line_size);
        }
    }
}
