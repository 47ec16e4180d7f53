//! Composition policy (spec.md §4.1, SPEC_FULL.md §4.1): routes an instance
//! to Greedy and/or CP Interval and assembles the final [`Solution`].
//!
//! Grounded structurally on `utf8proj-core::Scheduler::schedule` as a
//! tagged-choice capability trait rather than an inheritance hierarchy: the
//! router's decision is a plain enum, and this module pattern-matches it to
//! decide whether to call greedy alone, CP alone, or greedy followed by a
//! residual CP fill-in / full CP fallback.

use crate::greedy::{run_greedy_cancellable, GreedyOutcome};
use crate::interval::{run_cp_cancellable, CpOutcome, CpStatus};
use crate::ledger::OccupancyLedger;
use crate::router::{classify, RouteDecision};
use crate::validate::count_overlaps;
use std::collections::HashMap;
use std::time::Instant;
use taskslot_core::{
    Algorithm, CancellationToken, Clock, Instance, ScheduleError, ScheduledSlot, SchedulerConfig,
    Solution, SolutionStatus, SolveStats, Task, TaskId, UserId,
};

const RESIDUAL_FILL_IN_MAX_UNSCHEDULED: usize = 20;

/// Entry point used by both `taskslot_solver::schedule` variants. Validates
/// the instance, routes it, runs the chosen algorithm(s), and assembles the
/// final `Solution` including the post-solve overlap scan (§4.4.6/§4.5.6).
/// `token`, when given, is forwarded to whichever algorithm(s) are chosen.
pub fn orchestrate(
    instance: &Instance,
    clock: &dyn Clock,
    config: &SchedulerConfig,
    token: Option<&CancellationToken>,
) -> Result<Solution, ScheduleError> {
    instance.validate()?;

    let started = Instant::now();
    let decision = classify(instance, config);
    tracing::info!(?decision, "orchestrator: routing instance");

    let (mut all_slots, mut outcomes, algorithm_used, horizon_days, mut stats) = match decision {
        RouteDecision::Greedy => run_greedy_with_composition(instance, clock, config, token),
        RouteDecision::CpInterval => run_cp_only(instance, clock, config, token),
    };

    stats.overlaps_detected = count_overlaps(all_slots.values().flatten());
    stats.execution_time = started.elapsed();

    let tasks_total = instance.tasks.len() as u32;
    let tasks_scheduled = outcomes.values().filter(|o| matches!(o, taskslot_core::TaskOutcome::Scheduled)).count() as u32;
    let success_rate = if tasks_total == 0 {
        1.0
    } else {
        f64::from(tasks_scheduled) / f64::from(tasks_total)
    };

    let status = if tasks_total == 0 {
        SolutionStatus::Optimal
    } else if tasks_scheduled == tasks_total {
        if stats.overlaps_detected > 0 {
            SolutionStatus::Failed
        } else {
            SolutionStatus::Optimal
        }
    } else if tasks_scheduled > 0 {
        SolutionStatus::Partial
    } else {
        SolutionStatus::Infeasible
    };

    for task in &instance.tasks {
        all_slots.entry(task.id).or_default();
        outcomes.entry(task.id).or_insert_with(|| taskslot_core::TaskOutcome::Unscheduled {
            reason: "no placement strategy succeeded within the configured horizon".to_string(),
        });
    }

    Ok(Solution {
        tasks: all_slots,
        outcomes,
        status,
        algorithm_used,
        tasks_scheduled,
        tasks_total,
        success_rate,
        horizon_days,
        stats,
    })
}

type PartialSolve = (
    HashMap<TaskId, Vec<ScheduledSlot>>,
    HashMap<TaskId, taskslot_core::TaskOutcome>,
    Algorithm,
    u32,
    SolveStats,
);

fn run_cp_only(instance: &Instance, clock: &dyn Clock, config: &SchedulerConfig, token: Option<&CancellationToken>) -> PartialSolve {
    let cp = run_cp_cancellable(instance, clock, config, None, token);
    let (slots, outcomes) = cp_outcome_to_results(instance, &cp);
    let stats = stats_from_cp(&cp);
    (slots, outcomes, Algorithm::Ortools, cp.horizon_days, stats)
}

fn run_greedy_with_composition(
    instance: &Instance,
    clock: &dyn Clock,
    config: &SchedulerConfig,
    token: Option<&CancellationToken>,
) -> PartialSolve {
    let greedy = run_greedy_cancellable(instance, clock, config, token);

    if greedy.scheduled.is_empty() {
        tracing::info!("orchestrator: greedy scored zero assignments, falling back to CP on the full instance");
        let cp = run_cp_cancellable(instance, clock, config, None, token);
        let (slots, outcomes) = cp_outcome_to_results(instance, &cp);
        let stats = stats_from_cp(&cp);
        return (slots, outcomes, Algorithm::OrtoolsFallback, cp.horizon_days, stats);
    }

    let unscheduled_ids: Vec<TaskId> = instance
        .tasks
        .iter()
        .map(|t| t.id)
        .filter(|id| !greedy.scheduled.contains_key(id))
        .collect();

    if unscheduled_ids.is_empty() || unscheduled_ids.len() > RESIDUAL_FILL_IN_MAX_UNSCHEDULED {
        let outcomes = greedy_outcomes(instance, &greedy);
        let stats = stats_from_greedy(&greedy);
        return (greedy.scheduled, outcomes, Algorithm::Greedy, greedy.horizon_days, stats);
    }

    tracing::info!(
        unscheduled = unscheduled_ids.len(),
        "orchestrator: residual fill-in — running CP on unscheduled tasks alone"
    );
    let subset = build_subset_instance(instance, &unscheduled_ids);
    let residual_config = config.for_residual_fill_in();
    let cp = run_cp_cancellable(&subset, clock, &residual_config, Some(&greedy.ledger), token);

    let mut slots = greedy.scheduled.clone();
    let mut outcomes = greedy_outcomes(instance, &greedy);
    for id in &unscheduled_ids {
        if let Some(task_slots) = cp.scheduled.get(id) {
            if !task_slots.is_empty() || subset_task_needs_zero_hours(&subset, *id) {
                slots.insert(*id, task_slots.clone());
                outcomes.insert(*id, taskslot_core::TaskOutcome::Scheduled);
            }
        }
    }

    let algorithm_used = Algorithm::Greedy;
    let stats = stats_from_greedy(&greedy);
    (slots, outcomes, algorithm_used, greedy.horizon_days, stats)
}

fn subset_task_needs_zero_hours(subset: &Instance, id: TaskId) -> bool {
    subset.tasks.iter().any(|t| t.id == id && t.hours_needed() == 0)
}

fn greedy_outcomes(instance: &Instance, greedy: &GreedyOutcome) -> HashMap<TaskId, taskslot_core::TaskOutcome> {
    let mut outcomes = HashMap::new();
    for task in &instance.tasks {
        if greedy.scheduled.contains_key(&task.id) {
            outcomes.insert(task.id, taskslot_core::TaskOutcome::Scheduled);
        } else if let Some(reason) = greedy.failures.get(&task.id) {
            outcomes.insert(task.id, taskslot_core::TaskOutcome::Unscheduled { reason: reason.clone() });
        }
    }
    outcomes
}

fn cp_outcome_to_results(
    instance: &Instance,
    cp: &CpOutcome,
) -> (HashMap<TaskId, Vec<ScheduledSlot>>, HashMap<TaskId, taskslot_core::TaskOutcome>) {
    let mut outcomes = HashMap::new();
    for task in &instance.tasks {
        let has_slots = cp.scheduled.get(&task.id).is_some_and(|s| !s.is_empty() || task.hours_needed() == 0);
        let outcome = if matches!(cp.status, CpStatus::Infeasible) || !has_slots {
            taskslot_core::TaskOutcome::Unscheduled {
                reason: format!("CP solve status: {:?}", cp.status),
            }
        } else {
            taskslot_core::TaskOutcome::Scheduled
        };
        outcomes.insert(task.id, outcome);
    }
    (cp.scheduled.clone(), outcomes)
}

fn stats_from_greedy(greedy: &GreedyOutcome) -> SolveStats {
    SolveStats {
        horizon_extensions: greedy.horizon_extensions,
        overlaps_detected: 0,
        execution_time: std::time::Duration::default(),
        objective_value: None,
        num_branches: None,
        num_conflicts: None,
        num_booleans: None,
        num_constraints: None,
    }
}

fn stats_from_cp(cp: &CpOutcome) -> SolveStats {
    SolveStats {
        horizon_extensions: cp.horizon_extensions,
        overlaps_detected: 0,
        execution_time: std::time::Duration::default(),
        objective_value: cp.stats.objective_value,
        num_branches: cp.stats.num_branches,
        num_conflicts: cp.stats.num_conflicts,
        num_booleans: cp.stats.num_booleans,
        num_constraints: cp.stats.num_constraints,
    }
}

/// Build a reduced `Instance` covering only `task_ids` and their own
/// calendar rows and leaves.
///
/// `build_contiguous_slots` groups calendar rows strictly by their own
/// `task_id` (§4.5.1, mirroring `interval_model.py`'s
/// `groupby(['task_id', 'dayofweek'])` rather than the Availability
/// Builder's per-user union) — a task's CP candidate slots come only from
/// rows declared against that same task, never a sibling task of the same
/// user. A calendar row belonging to a task outside `task_ids` is therefore
/// never a candidate for any task in the subset, so dropping it changes
/// nothing; only `task_ids`' own rows matter here.
fn build_subset_instance(instance: &Instance, task_ids: &[TaskId]) -> Instance {
    let wanted: std::collections::HashSet<TaskId> = task_ids.iter().copied().collect();
    let tasks: Vec<Task> = instance.tasks.iter().filter(|t| wanted.contains(&t.id)).cloned().collect();
    let calendar_slots = instance.calendar_slots.iter().filter(|s| wanted.contains(&s.task_id)).cloned().collect();
    let leaves = instance.leaves.iter().filter(|l| wanted.contains(&l.task_id)).cloned().collect();

    Instance::new(tasks, calendar_slots, leaves)
}
