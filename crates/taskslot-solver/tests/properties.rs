//! Reusable invariant assertions applied across several fixtures (spec.md
//! §8 properties 1-5, 7, 10). Scenario-specific tests (S1-S6, properties
//! 6, 8, 9) live in `scenarios.rs`.

use chrono::NaiveDate;
use std::collections::HashSet;
use taskslot_core::{
    CalendarSlot, FixedClock, Instance, Leave, SchedulerConfig, Solution, Task, TaskId, UserId,
};
use taskslot_solver::schedule_with_clock;

fn task(id: u64, user: u64, hours: f64, priority: f64) -> Task {
    Task {
        id: TaskId(id),
        name: format!("t{id}"),
        user_id: UserId(user),
        remaining_hours: hours,
        priority_score: priority,
        hierarchy_level: None,
        is_leaf_task: None,
        parent_id: None,
    }
}

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

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() - chrono::Duration::days(1) // Monday minus 1
}

/// Property 1: every scheduled task's slot count equals `ceil(remaining_hours)`.
fn assert_hour_coverage(solution: &Solution, instance: &Instance) {
    for task in &instance.tasks {
        if let Some(slots) = solution.tasks.get(&task.id) {
            if matches!(
                solution.outcomes.get(&task.id),
                Some(taskslot_core::TaskOutcome::Scheduled)
            ) {
                assert_eq!(
                    slots.len() as u32,
                    task.hours_needed(),
                    "task {} should have exactly {} slots, found {}",
                    task.id,
                    task.hours_needed(),
                    slots.len()
                );
            }
        }
    }
}

/// Property 2: no `(user, date, hour)` triple is claimed by more than one
/// committed slot.
fn assert_no_double_booking(solution: &Solution) {
    let mut seen = HashSet::new();
    for slots in solution.tasks.values() {
        for slot in slots {
            assert!(
                seen.insert((slot.user_id, slot.date, slot.hour)),
                "double booking at user={} date={} hour={}",
                slot.user_id,
                slot.date,
                slot.hour
            );
        }
    }
    assert_eq!(solution.stats.overlaps_detected, 0);
}

/// Property 3: every committed slot falls within a calendar window declared
/// for that task's user on that weekday.
fn assert_calendar_respect(solution: &Solution, instance: &Instance) {
    use chrono::Datelike;
    let mut windows: std::collections::HashMap<(UserId, u8), Vec<(u8, u8)>> = std::collections::HashMap::new();
    let user_of: std::collections::HashMap<TaskId, UserId> =
        instance.tasks.iter().map(|t| (t.id, t.user_id)).collect();
    for cs in &instance.calendar_slots {
        if let Some(&user) = user_of.get(&cs.task_id) {
            windows.entry((user, cs.dayofweek)).or_default().push((cs.hour_from, cs.hour_to));
        }
    }
    for (task_id, slots) in &solution.tasks {
        let Some(&user) = user_of.get(task_id) else { continue };
        for slot in slots {
            let weekday = slot.date.weekday().num_days_from_monday() as u8;
            let ranges = windows.get(&(user, weekday));
            assert!(
                ranges.is_some_and(|rs| rs.iter().any(|&(from, to)| slot.hour >= from && slot.hour < to)),
                "slot for task {} at {} hour {} falls outside calendar",
                task_id,
                slot.date,
                slot.hour
            );
        }
    }
}

/// Property 4: no committed slot's date falls within any leave belonging to
/// that slot's user (leaves are unioned per-user, §9).
fn assert_leave_respect(solution: &Solution, instance: &Instance) {
    let user_of: std::collections::HashMap<TaskId, UserId> =
        instance.tasks.iter().map(|t| (t.id, t.user_id)).collect();
    let mut leaves_by_user: std::collections::HashMap<UserId, Vec<Leave>> = std::collections::HashMap::new();
    for leave in &instance.leaves {
        if let Some(&user) = user_of.get(&leave.task_id) {
            leaves_by_user.entry(user).or_default().push(*leave);
        }
    }
    for (task_id, slots) in &solution.tasks {
        let Some(&user) = user_of.get(task_id) else { continue };
        let Some(leaves) = leaves_by_user.get(&user) else { continue };
        for slot in slots {
            assert!(
                !leaves.iter().any(|l| l.contains(slot.date)),
                "slot for task {} on {} falls within a leave",
                task_id,
                slot.date
            );
        }
    }
}

/// Property 5: every committed slot's date is strictly after "today".
fn assert_future_only(solution: &Solution, today: NaiveDate) {
    for slots in solution.tasks.values() {
        for slot in slots {
            assert!(slot.date > today, "slot on {} is not strictly after today {}", slot.date, today);
        }
    }
}

#[test]
fn coverage_holds_for_a_simple_multi_task_instance() {
    let instance = Instance::new(
        vec![task(1, 1, 5.0, 40.0), task(2, 2, 3.0, 20.0), task(3, 1, 1.0, 90.0)],
        {
            let mut slots = mon_fri_9_5(1);
            slots.extend(mon_fri_9_5(2));
            slots.extend(mon_fri_9_5(3));
            slots
        },
        vec![],
    );
    let clock = FixedClock(fixed_today());
    let solution = schedule_with_clock(&instance, &clock, &SchedulerConfig::default()).unwrap();
    assert_hour_coverage(&solution, &instance);
    assert_no_double_booking(&solution);
    assert_calendar_respect(&solution, &instance);
    assert_future_only(&solution, clock.0);
}

#[test]
fn leave_respected_alongside_other_invariants() {
    let d0 = fixed_today();
    let first_planning_day = d0 + chrono::Duration::days(1);
    let instance = Instance::new(
        vec![task(1, 1, 4.0, 10.0)],
        mon_fri_9_5(1),
        vec![Leave {
            task_id: TaskId(1),
            date_from: first_planning_day,
            date_to: first_planning_day + chrono::Duration::days(6),
        }],
    );
    let clock = FixedClock(d0);
    let solution = schedule_with_clock(&instance, &clock, &SchedulerConfig::default()).unwrap();
    assert_hour_coverage(&solution, &instance);
    assert_no_double_booking(&solution);
    assert_calendar_respect(&solution, &instance);
    assert_leave_respect(&solution, &instance);
    assert_future_only(&solution, d0);
}

/// Property 10: round-trip through `serde_json` preserves every field.
#[test]
fn solution_round_trips_through_json() {
    let instance = Instance::new(vec![task(1, 1, 2.0, 10.0)], mon_fri_9_5(1), vec![]);
    let clock = FixedClock(fixed_today());
    let solution = schedule_with_clock(&instance, &clock, &SchedulerConfig::default()).unwrap();
    let json = serde_json::to_string(&solution).unwrap();
    let back: Solution = serde_json::from_str(&json).unwrap();
    assert_eq!(serde_json::to_value(&solution).unwrap(), serde_json::to_value(&back).unwrap());
}

/// The persisted form (§6) carries `success_rate` and every `SolveStats`
/// field at the top level of the JSON object, not nested under `"stats"`.
#[test]
fn solution_json_has_the_documented_flat_shape() {
    let instance = Instance::new(vec![task(1, 1, 2.0, 10.0)], mon_fri_9_5(1), vec![]);
    let clock = FixedClock(fixed_today());
    let solution = schedule_with_clock(&instance, &clock, &SchedulerConfig::default()).unwrap();
    let value = serde_json::to_value(&solution).unwrap();
    let obj = value.as_object().unwrap();
    assert!(obj.contains_key("success_rate"));
    assert!(obj.contains_key("horizon_extensions"));
    assert!(obj.contains_key("overlaps_detected"));
    assert!(obj.contains_key("execution_time"));
    assert!(!obj.contains_key("stats"), "stats should be flattened, not nested");
}

/// Property 7 (determinism): two greedy solves over identical input and a
/// `FixedClock` produce byte-identical-after-serialization solutions.
#[test]
fn greedy_path_is_deterministic_across_runs() {
    let tasks: Vec<Task> = (0..60).map(|i| task(i, i % 3, 2.0, 10.0)).collect();
    let mut calendar = Vec::new();
    for t in &tasks {
        calendar.extend(mon_fri_9_5(t.id.0));
    }
    let instance = Instance::new(tasks, calendar, vec![]);
    let clock = FixedClock(fixed_today());
    let config = SchedulerConfig::default();
    let a = schedule_with_clock(&instance, &clock, &config).unwrap();
    let b = schedule_with_clock(&instance, &clock, &config).unwrap();
    assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
}
