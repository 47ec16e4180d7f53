//! Hybrid Router (spec.md §4.1).
//!
//! Classifies an instance by size and picks Greedy or CP Interval. The
//! decision is logged but is not part of the correctness contract: both
//! paths must produce a solution satisfying the data-model invariants when
//! one exists within the horizon.

use taskslot_core::{Instance, SchedulerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Greedy,
    CpInterval,
}

/// `T = |tasks|`, `H = sum(remaining_hours)`, `U = distinct users`,
/// `A = H/T`. Greedy when `T > threshold_tasks OR H > threshold_hours OR
/// U > threshold_users OR A > threshold_avg_hours`; otherwise CP Interval.
/// `hybrid_mode = false` forces CP regardless of size.
pub fn classify(instance: &Instance, config: &SchedulerConfig) -> RouteDecision {
    if !config.hybrid_mode {
        return RouteDecision::CpInterval;
    }

    let t = instance.tasks.len();
    let h = instance.total_hours();
    let u = instance.distinct_users().len();
    let a = if t == 0 { 0.0 } else { h / t as f64 };

    let decision = if t as u32 > config.greedy_threshold_tasks
        || h > config.greedy_threshold_hours
        || u as u32 > config.greedy_threshold_users
        || a > config.greedy_threshold_avg_hours
    {
        RouteDecision::Greedy
    } else {
        RouteDecision::CpInterval
    };

    tracing::debug!(tasks = t, hours = h, users = u, avg_hours = a, ?decision, "router: classified instance");
    decision
}
