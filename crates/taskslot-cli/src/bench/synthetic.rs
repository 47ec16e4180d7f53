//! Deterministic synthetic instance generators, one per [`super::Topology`].
//!
//! No randomness: every generator is a pure function of `task_count` so a
//! benchmark run is reproducible without needing a seeded RNG dependency.
//! Task/calendar construction is embarrassingly parallel across task index,
//! which is the only reason this binary pulls in `rayon` at all.

use rayon::prelude::*;
use taskslot_core::{CalendarSlot, Instance, Task, TaskId, UserId};

const USERS_PER_BENCHMARK: u64 = 12;

fn mon_fri_9_5(task_id: u64) -> Vec<CalendarSlot> {
    (0..5)
        .map(|d| CalendarSlot {
            task_id: TaskId(task_id),
            dayofweek: d,
            hour_from: 9,
            hour_to: 17,
        })
        .collect()
}

/// One user, one calendar pattern, hours and priority varying a little per
/// task so the greedy ordering has something to sort.
pub fn generate_uniform(task_count: usize) -> Instance {
    let tasks: Vec<Task> = (0..task_count as u64)
        .into_par_iter()
        .map(|i| Task {
            id: TaskId(i),
            name: format!("uniform-{i}"),
            user_id: UserId(i % USERS_PER_BENCHMARK),
            remaining_hours: 2.0 + (i % 6) as f64,
            priority_score: 10.0 + (i % 20) as f64,
            hierarchy_level: None,
            is_leaf_task: None,
            parent_id: None,
        })
        .collect();
    let calendar: Vec<CalendarSlot> = tasks.par_iter().flat_map(|t| mon_fri_9_5(t.id.0)).collect();
    Instance::new(tasks, calendar, vec![])
}

/// Every third user gets a single narrow Tuesday window; the rest get a full
/// working week. Exercises the Availability Builder's per-user union of
/// very different calendar shapes.
pub fn generate_clustered(task_count: usize) -> Instance {
    let tasks: Vec<Task> = (0..task_count as u64)
        .into_par_iter()
        .map(|i| Task {
            id: TaskId(i),
            name: format!("clustered-{i}"),
            user_id: UserId(i % USERS_PER_BENCHMARK),
            remaining_hours: 1.0 + (i % 4) as f64,
            priority_score: 5.0 + (i % 15) as f64,
            hierarchy_level: None,
            is_leaf_task: None,
            parent_id: None,
        })
        .collect();
    let calendar: Vec<CalendarSlot> = tasks
        .par_iter()
        .flat_map(|t| {
            if t.user_id.0 % 3 == 0 {
                vec![CalendarSlot {
                    task_id: t.id,
                    dayofweek: 1,
                    hour_from: 13,
                    hour_to: 15,
                }]
            } else {
                mon_fri_9_5(t.id.0)
            }
        })
        .collect();
    Instance::new(tasks, calendar, vec![])
}

/// Mostly 2-hour tasks with a long tail of oversized ones at the end,
/// useful for exercising horizon extension under the greedy threshold.
pub fn generate_skewed(task_count: usize) -> Instance {
    let tail_start = task_count.saturating_sub(task_count / 20 + 1) as u64;
    let tasks: Vec<Task> = (0..task_count as u64)
        .into_par_iter()
        .map(|i| {
            let remaining_hours = if i >= tail_start { 60.0 + (i % 40) as f64 } else { 2.0 };
            Task {
                id: TaskId(i),
                name: format!("skewed-{i}"),
                user_id: UserId(i % USERS_PER_BENCHMARK),
                remaining_hours,
                priority_score: 10.0 + (i % 20) as f64,
                hierarchy_level: None,
                is_leaf_task: None,
                parent_id: None,
            }
        })
        .collect();
    let calendar: Vec<CalendarSlot> = tasks.par_iter().flat_map(|t| mon_fri_9_5(t.id.0)).collect();
    Instance::new(tasks, calendar, vec![])
}
