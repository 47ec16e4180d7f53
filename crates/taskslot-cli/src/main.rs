//! taskslot CLI - hybrid hourly task-scheduling engine
//!
//! Thin demonstration binary around `taskslot_solver::schedule`: reads a
//! JSON instance file, calls the scheduler, writes a JSON solution to
//! stdout or a file. Also ships `init` (write a starter instance file) and
//! `bench` (synthetic fixtures for exercising the hybrid router at scale) -
//! the same shape of wiring the teacher keeps around its own library.

#[cfg(feature = "bench")]
mod bench;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskslot_core::{Instance, SchedulerConfig};

#[derive(Parser)]
#[command(name = "taskslot")]
#[command(author, version, about = "Hybrid hourly task-scheduling engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule an instance file and print or write the resulting solution
    Schedule {
        /// Path to a JSON file holding `{"tasks": [...], "calendar_slots": [...], "leaves": [...]}`
        #[arg(value_name = "FILE")]
        file: std::path::PathBuf,

        /// Optional TOML or JSON file overriding `SchedulerConfig` defaults
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,

        /// Force the CP path regardless of instance size (overrides config's hybrid_mode)
        #[arg(long)]
        force_cp: bool,
    },

    /// Write a small starter instance file to get going
    Init {
        /// Output file path (default: instance.json in the current directory)
        #[arg(value_name = "FILE")]
        file: Option<std::path::PathBuf>,
    },

    /// Run a synthetic benchmark against the hybrid router
    #[cfg(feature = "bench")]
    Bench {
        /// Synthetic topology to generate
        #[arg(short, long, value_enum, default_value = "uniform")]
        topology: bench::Topology,

        /// Number of tasks to generate
        #[arg(short = 'n', long, default_value = "500")]
        count: usize,

        /// Optional TOML or JSON file overriding `SchedulerConfig` defaults
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Schedule {
            file,
            config,
            output,
            pretty,
            force_cp,
        }) => cmd_schedule(&file, config.as_deref(), output.as_deref(), pretty, force_cp),
        Some(Commands::Init { file }) => cmd_init(file.as_deref()),
        #[cfg(feature = "bench")]
        Some(Commands::Bench { topology, count, config }) => cmd_bench(topology, count, config.as_deref()),
        None => {
            println!("taskslot - Hybrid hourly task-scheduling engine");
            println!();
            println!("Usage: taskslot <COMMAND>");
            println!();
            println!("Commands:");
            println!("  schedule   Schedule an instance file and print the solution");
            println!("  init       Write a small starter instance file");
            println!("  bench      Run a synthetic benchmark against the hybrid router");
            println!();
            println!("Run 'taskslot --help' for more information");
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<SchedulerConfig> {
    let Some(path) = path else {
        return Ok(SchedulerConfig::default());
    };
    let content = fs::read_to_string(path).with_context(|| format!("failed to read config file '{}'", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            serde_json::from_str(&content).with_context(|| format!("failed to parse '{}' as JSON config", path.display()))
        }
        _ => toml::from_str(&content).with_context(|| format!("failed to parse '{}' as TOML config", path.display())),
    }
}

/// Schedule command: parse the instance, run the hybrid scheduler, emit JSON.
fn cmd_schedule(
    file: &std::path::Path,
    config_path: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
    pretty: bool,
    force_cp: bool,
) -> Result<()> {
    let content = fs::read_to_string(file).with_context(|| format!("failed to read '{}'", file.display()))?;
    let instance: Instance =
        serde_json::from_str(&content).with_context(|| format!("failed to parse '{}' as an instance", file.display()))?;

    let mut config = load_config(config_path)?;
    if force_cp {
        config.hybrid_mode = false;
    }

    let span = tracing::info_span!("cli_schedule", tasks = instance.tasks.len(), file = %file.display());
    let _guard = span.enter();

    let solution = taskslot_solver::schedule(&instance, &config).with_context(|| "scheduling failed")?;

    tracing::info!(
        status = ?solution.status,
        algorithm = ?solution.algorithm_used,
        scheduled = solution.tasks_scheduled,
        total = solution.tasks_total,
        "solve complete"
    );

    let rendered = if pretty {
        serde_json::to_string_pretty(&solution)
    } else {
        serde_json::to_string(&solution)
    }
    .with_context(|| "failed to serialize solution")?;

    match output {
        Some(path) => {
            let mut out_file = fs::File::create(path).with_context(|| format!("failed to create output file '{}'", path.display()))?;
            out_file.write_all(rendered.as_bytes()).with_context(|| "failed to write output")?;
            eprintln!("Solution written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if solution.stats.overlaps_detected > 0 {
        anyhow::bail!("solver produced {} overlapping slot(s) - internal invariant violated", solution.stats.overlaps_detected);
    }

    Ok(())
}

/// Init command: write a small starter instance file covering two tasks,
/// two users, and a Monday-Friday 9-5 calendar.
fn cmd_init(output: Option<&std::path::Path>) -> Result<()> {
    let path = output.map(std::path::PathBuf::from).unwrap_or_else(|| std::path::PathBuf::from("instance.json"));

    if path.exists() {
        anyhow::bail!("File '{}' already exists. Pass a different path.", path.display());
    }

    let instance = serde_json::json!({
        "tasks": [
            { "id": 1, "name": "design doc", "user_id": 1, "remaining_hours": 6.0, "priority_score": 50.0, "hierarchy_level": null, "is_leaf_task": null, "parent_id": null },
            { "id": 2, "name": "implementation", "user_id": 2, "remaining_hours": 16.0, "priority_score": 30.0, "hierarchy_level": null, "is_leaf_task": null, "parent_id": null }
        ],
        "calendar_slots": [
            { "task_id": 1, "dayofweek": 0, "hour_from": 9, "hour_to": 17 },
            { "task_id": 1, "dayofweek": 1, "hour_from": 9, "hour_to": 17 },
            { "task_id": 1, "dayofweek": 2, "hour_from": 9, "hour_to": 17 },
            { "task_id": 1, "dayofweek": 3, "hour_from": 9, "hour_to": 17 },
            { "task_id": 1, "dayofweek": 4, "hour_from": 9, "hour_to": 17 },
            { "task_id": 2, "dayofweek": 0, "hour_from": 9, "hour_to": 17 },
            { "task_id": 2, "dayofweek": 1, "hour_from": 9, "hour_to": 17 },
            { "task_id": 2, "dayofweek": 2, "hour_from": 9, "hour_to": 17 },
            { "task_id": 2, "dayofweek": 3, "hour_from": 9, "hour_to": 17 },
            { "task_id": 2, "dayofweek": 4, "hour_from": 9, "hour_to": 17 }
        ],
        "leaves": []
    });

    fs::write(&path, serde_json::to_string_pretty(&instance)?).with_context(|| format!("failed to write '{}'", path.display()))?;
    eprintln!("Wrote starter instance to '{}'. Run:", path.display());
    eprintln!("  taskslot schedule {}", path.display());
    Ok(())
}

#[cfg(feature = "bench")]
fn cmd_bench(topology: bench::Topology, count: usize, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let result = bench::run_synthetic_benchmark(topology, count, &config)?;

    println!("Topology:          {}", result.topology);
    println!("Tasks:             {}", result.task_count);
    println!("Generation time:   {:?}", result.generation_time);
    println!("Schedule time:     {:?}", result.schedule_time);
    println!("Algorithm used:    {}", result.algorithm_used);
    println!("Success rate:      {:.1}%", result.success_rate * 100.0);
    println!("Horizon extensions:{}", result.horizon_extensions);

    Ok(())
}
