//! # taskslot-solver
//!
//! The hybrid hourly task-scheduling engine: the Hybrid Router, Availability
//! Builder, Occupancy Ledger, Greedy Scheduler, and CP Interval Scheduler
//! from spec.md §4, composed by the orchestrator per §4.1.
//!
//! The only entry points a caller needs are [`schedule`] (production, backed
//! by [`SystemClock`](taskslot_core::SystemClock)) and [`schedule_with_clock`]
//! (for deterministic tests, matching the teacher's own pattern of taking an
//! injected clock rather than calling `Utc::now()` throughout).

mod availability;
mod greedy;
mod interval;
mod ledger;
mod orchestrator;
mod router;
mod validate;

pub use availability::{build_availability, horizon_dates, AvailabilityMap};
pub use greedy::{order_tasks, run_greedy, run_greedy_cancellable, GreedyOutcome};
pub use interval::{build_contiguous_slots, run_cp, run_cp_cancellable, ContiguousSlot, CpOutcome, CpStatus};
pub use ledger::OccupancyLedger;
pub use router::{classify, RouteDecision};
pub use validate::{count_overlaps, hour_coverage_holds};

use taskslot_core::{CancellationToken, Clock, Instance, ScheduleError, SchedulerConfig, Solution, SystemClock};

/// Schedule `instance` under `config`, using the system wall clock for
/// `first_planning_day` (tomorrow, UTC).
pub fn schedule(instance: &Instance, config: &SchedulerConfig) -> Result<Solution, ScheduleError> {
    schedule_with_clock(instance, &SystemClock, config)
}

/// Same as [`schedule`] but with an injected [`Clock`], so tests can pin
/// "today" and assert on the resulting horizon deterministically.
pub fn schedule_with_clock(instance: &Instance, clock: &dyn Clock, config: &SchedulerConfig) -> Result<Solution, ScheduleError> {
    orchestrator::orchestrate(instance, clock, config, None)
}

/// Same as [`schedule_with_clock`] but cooperatively cancellable: `token`,
/// when given, is polled between horizon retry attempts and between task
/// placements on both the greedy and CP paths (§5's "single cooperative
/// context" model — a job may be cancelled between strategies or at solver
/// retry checkpoints, never mid-constraint-posting).
pub fn schedule_cancellable(
    instance: &Instance,
    clock: &dyn Clock,
    config: &SchedulerConfig,
    token: &CancellationToken,
) -> Result<Solution, ScheduleError> {
    orchestrator::orchestrate(instance, clock, config, Some(token))
}
