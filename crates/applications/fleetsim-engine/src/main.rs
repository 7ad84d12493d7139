//! Fleetsim CLI
//!
//! Runs a load-balancer fleet simulation for a number of ticks.
//!
//! ```bash
//! # Prompt for server count and duration
//! fleetsim
//!
//! # Fully specified, reproducible, with the event log written to a file
//! fleetsim --servers 10 --duration 500 --seed 7 --log-file log.txt
//!
//! # From a JSON config, exporting results
//! fleetsim --config run.json --output results.json --events events.json
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use fleetsim_core::event::EVENT_TARGET;
use fleetsim_core::{MemorySink, TracingSink};
use fleetsim_engine::{
    ConfigOverrides, PolicyKind, RunConfig, SimulationConfig, SimulationResult, Simulator,
};

#[derive(Parser, Debug)]
#[command(name = "fleetsim")]
#[command(
    about = "Simulate a load-balancing fleet with queue-driven autoscaling",
    long_about = None
)]
struct Args {
    /// Initial number of servers (also the autoscaling floor); prompted when omitted
    #[arg(short, long, allow_negative_numbers = true)]
    servers: Option<i64>,

    /// Number of ticks to simulate; prompted when omitted
    #[arg(short, long, allow_negative_numbers = true)]
    duration: Option<i64>,

    /// JSON simulation config (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for reproducible traffic
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum new requests per tick
    #[arg(long)]
    min_arrivals: Option<usize>,

    /// Maximum new requests per tick
    #[arg(long)]
    max_arrivals: Option<usize>,

    /// Requests pre-loaded per initial server
    #[arg(long)]
    backlog_per_server: Option<usize>,

    /// Autoscaling policy
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// Also write the event log to this file (replaced on every run)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output JSON file for the run summary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output JSON file for the full event stream
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_file.as_deref())?;

    let config = resolve_config(&args)?;

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Fleetsim Load Balancer Simulation                       ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    println!("Configuration:");
    println!("  Servers: {}", config.run.initial_servers);
    println!("  Duration: {} ticks", config.run.duration_ticks);
    println!("  Backlog: {} requests", config.backlog_size());
    println!(
        "  Arrivals: {}-{} per tick",
        config.arrivals.min_per_tick, config.arrivals.max_per_tick
    );
    println!("  Policy: {:?}", config.policy.kind);
    match config.seed {
        Some(seed) => println!("  Seed: {seed}\n"),
        None => println!("  Seed: random\n"),
    }

    let mut simulator = Simulator::new(config).context("failed to build simulator")?;

    let result = match &args.events {
        Some(path) => {
            let mut sink = MemorySink::tee(TracingSink);
            let result = simulator.run(&mut sink)?;
            let json = serde_json::to_string_pretty(sink.events())?;
            fs::write(path, json)
                .with_context(|| format!("failed to write events to {}", path.display()))?;
            info!(path = %path.display(), events = sink.events().len(), "event stream saved");
            result
        }
        None => simulator.run(&mut TracingSink)?,
    };

    print_results(&result);

    if let Some(path) = &args.output {
        println!("\nWriting results to {}...", path.display());
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        println!("  Results saved");
    }

    println!("\n✅ Simulation complete!\n");
    Ok(())
}

/// Console logging from `RUST_LOG`, plus an optional event-log file
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };

            reset_log_file(path)?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(Targets::new().with_target(EVENT_TARGET, Level::DEBUG));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "fleetsim=info".into()),
            ),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Start each run with an empty log file; the appender only ever appends
fn reset_log_file(path: &Path) -> Result<()> {
    fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    Ok(())
}

/// Merge config file, flags and interactive answers into one validated config
fn resolve_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimulationConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => {
            let servers = match args.servers {
                Some(n) => n,
                None => prompt_i64("Enter the number of servers: ")?,
            };
            let duration = match args.duration {
                Some(n) => n,
                None => prompt_i64("Enter the duration for the load balancer (in ticks): ")?,
            };
            SimulationConfig::new(RunConfig::try_new(servers, duration)?)
        }
    };

    config.apply_overrides(&args.overrides())?;
    Ok(config)
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            servers: self.servers,
            duration: self.duration,
            seed: self.seed,
            min_arrivals: self.min_arrivals,
            max_arrivals: self.max_arrivals,
            backlog_per_server: self.backlog_per_server,
            policy: self.policy,
        }
    }
}

fn prompt_i64(question: &str) -> Result<i64> {
    print!("{question}");
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        bail!("no input provided for: {}", question.trim_end_matches(": "));
    }

    let answer = line.trim();
    answer
        .parse::<i64>()
        .with_context(|| format!("expected an integer, got {answer:?}"))
}

fn print_results(result: &SimulationResult) {
    println!("\n╔══════════════════════════════════════════════════════════╗");
    println!("║  Simulation Results                                      ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    println!(
        "{:<12} {:>8} {:>10} {:>10} {:>12} {:>12} {:>12}",
        "Policy", "Ticks", "Arrivals", "Handled", "Pool (peak)", "Queue (end)", "Queue (avg)"
    );
    println!("{}", "-".repeat(82));
    println!(
        "{:<12} {:>8} {:>10} {:>10} {:>5} ({:>4}) {:>12} {:>12.1}",
        result.policy_name,
        result.ticks_run,
        result.total_arrivals,
        result.total_dispatched,
        result.final_pool_size,
        result.peak_pool_size,
        result.final_queue_size,
        result.average_queue_size,
    );
    println!("{}", "-".repeat(82));
    println!(
        "Servers added: {}  removed: {}  (floor {})",
        result.servers_added, result.servers_removed, result.initial_servers
    );
}
