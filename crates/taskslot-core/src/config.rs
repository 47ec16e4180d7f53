//! `SchedulerConfig` — every tunable named in spec.md §6, with the defaults
//! named there. Derives `Serialize`/`Deserialize` so `taskslot-cli` can
//! layer an optional TOML file plus CLI flag overrides on top of
//! `SchedulerConfig::default()`, the same two-stage pattern the teacher
//! uses for its own configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Initial horizon length in days (`D0`). Default 28.
    pub initial_horizon_days: u32,
    /// CP horizon growth multiplier per retry. Default 1.25; a retry always
    /// grows the horizon by at least 7 days even if the multiplier alone
    /// would add less.
    pub horizon_extension_factor: f64,
    /// Hard cap on horizon length. Default 3650.
    pub max_horizon_days: u32,
    /// Per-CP-iteration wall-clock budget, capped at 300s internally.
    /// Default 30.
    pub ortools_time_limit_seconds: u64,
    /// CP solver worker count. Default 4.
    pub num_search_workers: u32,
    pub greedy_threshold_tasks: u32,
    pub greedy_threshold_hours: f64,
    pub greedy_threshold_users: u32,
    pub greedy_threshold_avg_hours: f64,
    /// If `false`, force the CP path regardless of instance size.
    pub hybrid_mode: bool,
    /// CP solver determinism seed. `pumpkin-solver` is seeded from this
    /// when present; two runs with an identical seed and time limit
    /// reproduce the same solution (§5).
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_horizon_days: 28,
            horizon_extension_factor: 1.25,
            max_horizon_days: 3650,
            ortools_time_limit_seconds: 30,
            num_search_workers: 4,
            greedy_threshold_tasks: 50,
            greedy_threshold_hours: 1000.0,
            greedy_threshold_users: 10,
            greedy_threshold_avg_hours: 100.0,
            hybrid_mode: true,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// The reduced-horizon, aggressive-extension, hard-budget config used
    /// for the residual fill-in CP pass after a greedy solve (§4.1): 14-day
    /// initial horizon, 1.5x extension factor, 30s budget, everything else
    /// inherited from `self`.
    pub fn for_residual_fill_in(&self) -> Self {
        Self {
            initial_horizon_days: 14,
            horizon_extension_factor: 1.5,
            ortools_time_limit_seconds: 30,
            ..self.clone()
        }
    }

    pub fn capped_time_limit_seconds(&self) -> u64 {
        self.ortools_time_limit_seconds.min(300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = SchedulerConfig::default();
        assert_eq!(c.initial_horizon_days, 28);
        assert_eq!(c.max_horizon_days, 3650);
        assert_eq!(c.ortools_time_limit_seconds, 30);
        assert_eq!(c.num_search_workers, 4);
        assert_eq!(c.greedy_threshold_tasks, 50);
        assert!((c.greedy_threshold_hours - 1000.0).abs() < f64::EPSILON);
        assert_eq!(c.greedy_threshold_users, 10);
        assert!((c.greedy_threshold_avg_hours - 100.0).abs() < f64::EPSILON);
        assert!(c.hybrid_mode);
    }

    #[test]
    fn residual_fill_in_overrides_only_horizon_params() {
        let base = SchedulerConfig {
            num_search_workers: 8,
            ..Default::default()
        };
        let residual = base.for_residual_fill_in();
        assert_eq!(residual.initial_horizon_days, 14);
        assert!((residual.horizon_extension_factor - 1.5).abs() < f64::EPSILON);
        assert_eq!(residual.num_search_workers, 8);
    }
}
