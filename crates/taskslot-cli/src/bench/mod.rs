//! Synthetic fixture generation for exercising the hybrid router at scale.
//!
//! Not part of the library's public surface — this lives in the
//! demonstration binary only, the same place the teacher keeps its own
//! benchmark topology generators.

pub mod synthetic;

use std::time::{Duration, Instant};
use taskslot_core::{Instance, SchedulerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Topology {
    /// Every task shares one calendar pattern across a handful of users.
    Uniform,
    /// Calendar coverage per user is clustered: some users fully booked,
    /// most sparse.
    Clustered,
    /// A long tail of oversized tasks mixed in with small ones.
    Skewed,
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Uniform => write!(f, "uniform"),
            Topology::Clustered => write!(f, "clustered"),
            Topology::Skewed => write!(f, "skewed"),
        }
    }
}

pub struct BenchmarkResult {
    pub topology: Topology,
    pub task_count: usize,
    pub generation_time: Duration,
    pub schedule_time: Duration,
    pub algorithm_used: String,
    pub success_rate: f64,
    pub horizon_extensions: u32,
}

pub fn run_synthetic_benchmark(topology: Topology, task_count: usize, config: &SchedulerConfig) -> anyhow::Result<BenchmarkResult> {
    let gen_start = Instant::now();
    let instance: Instance = match topology {
        Topology::Uniform => synthetic::generate_uniform(task_count),
        Topology::Clustered => synthetic::generate_clustered(task_count),
        Topology::Skewed => synthetic::generate_skewed(task_count),
    };
    let generation_time = gen_start.elapsed();

    let schedule_start = Instant::now();
    let solution = taskslot_solver::schedule(&instance, config)?;
    let schedule_time = schedule_start.elapsed();

    Ok(BenchmarkResult {
        topology,
        task_count,
        generation_time,
        schedule_time,
        algorithm_used: format!("{:?}", solution.algorithm_used),
        success_rate: solution.success_rate,
        horizon_extensions: solution.stats.horizon_extensions,
    })
}
