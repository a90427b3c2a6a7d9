//! Persona Engine Simulator CLI
//!
//! Run deterministic audience scenarios through the full reaction pipeline.

use clap::Parser;
use persona_core::PipelineConfig;
use persona_sim::scenarios::ScenarioId;
use persona_sim::{RunExport, ScenarioResult, ScenarioRunner};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Persona Engine deterministic simulation CLI
#[derive(Parser, Debug)]
#[command(name = "persona-sim")]
#[command(about = "Run deterministic audience scenarios through the persona engine", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Personas generated per audience segment
    #[arg(short, long, default_value = "3")]
    personas: usize,

    /// Scenario to run (baseline, polarizing, viral, apathetic, flaky_oracle, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Group chat turns (overrides the config file)
    #[arg(short, long)]
    turns: Option<usize>,

    /// Pipeline configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the same-seed replay check
    #[arg(long)]
    skip_replay: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the full run (personas, reactions, report) to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn load_config(args: &Args) -> PipelineConfig {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => PipelineConfig::default(),
    };
    let config = match args.turns {
        Some(turns) => config.with_chat_turns(turns),
        None => config,
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    config
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Persona Engine Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = load_config(&args);

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: baseline, polarizing, viral, apathetic, flaky_oracle, all");
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 || args.seeds > 1 {
            eprintln!("Error: --export only supports a single scenario and seed");
            std::process::exit(1);
        }

        let result = ScenarioRunner::new(base_seed, args.personas)
            .with_config(config)
            .with_determinism_check(!args.skip_replay)
            .run(scenarios[0])
            .await;

        match RunExport::from_result(&result).write_to_file(export_path) {
            Ok(()) => info!("Exported {} (seed={}) to {}", scenarios[0].name(), base_seed, export_path.display()),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }

        if result.passed {
            info!("✓ {} (seed={}) PASSED", scenarios[0].name(), base_seed);
        } else {
            error!(
                "✗ {} FAILED: {}",
                scenarios[0].name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runner = ScenarioRunner::new(seed, args.personas)
            .with_config(config.clone())
            .with_determinism_check(!args.skip_replay);

        for scenario in &scenarios {
            let result = runner.run(*scenario).await;

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
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

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "metrics": r.metrics,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        info!("");
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
