//! Hypercube DST Simulator CLI
//!
//! Run load-balancing scenarios against the non-distributed baseline.

use clap::Parser;
use hypercube_core::BalancerConfig;
use hypercube_env::TokioContext;
use hypercube_sim::{ScenarioId, ScenarioResult, ScenarioRunner, SimError};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Hypercube gradient load balancer simulation CLI
#[derive(Parser, Debug)]
#[command(name = "hypercube-sim")]
#[command(about = "Run deterministic load-balancing scenarios on a hypercube cluster", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Hypercube dimension (2^D worker nodes)
    #[arg(short, long, default_value = "3")]
    dimensions: u32,

    /// Base number of tasks per scenario
    #[arg(short, long, default_value = "64")]
    tasks: usize,

    /// Largest generated task weight
    #[arg(short = 'w', long, default_value = "10")]
    max_weight: u32,

    /// Scenario to run (uniform, heavy_tail, hotspot, burst, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Balancer tunables as a JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the real tokio clock instead of virtual time
    #[arg(long)]
    real_time: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Print per-node statistics after each run
    #[arg(long)]
    stats: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_scenarios(name: &str) -> Result<Vec<ScenarioId>, SimError> {
    if name == "all" {
        Ok(ScenarioId::all())
    } else {
        Ok(vec![name.parse()?])
    }
}

// A seed replays the same task interleaving only on a single thread
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.json {
        info!("Hypercube DST Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios = parse_scenarios(&args.scenario).unwrap_or_else(|e| {
        error!("{}", e);
        error!("Available scenarios: uniform, heavy_tail, hotspot, burst, all");
        std::process::exit(1);
    });

    for scenario in &scenarios {
        debug!("{}: {}", scenario.name(), scenario.description());
    }

    let config = match &args.config {
        Some(path) => BalancerConfig::from_file(path).unwrap_or_else(|e| {
            error!("Failed to load config {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => BalancerConfig::default(),
    };

    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed, args.dimensions)
            .with_task_count(args.tasks)
            .with_max_weight(args.max_weight)
            .with_config(config.clone())
            .with_statistics(args.stats && !args.json);

        for scenario in &scenarios {
            let outcome = if args.real_time {
                runner.run_with(*scenario, TokioContext::shared).await
            } else {
                runner.run(*scenario).await
            };

            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!("✗ {} (seed={}) ERROR: {}", scenario.name(), seed, e);
                    failed_count += 1;
                    continue;
                }
            };

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED - deviation {:.2}% vs baseline {:.2}%",
                        scenario.name(),
                        seed,
                        result.distributed.deviation_percentage,
                        result.baseline.deviation_percentage
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    let total = args.seeds * scenarios.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize results: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
