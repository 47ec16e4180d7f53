//! Greedy Scheduler (spec.md §4.4).
//!
//! Orders tasks deterministically, sizes an initial horizon from aggregate
//! per-user demand, then for each task in turn runs a cascade of four
//! placement strategies against that user's `AvailableBlock`s and the
//! shared `OccupancyLedger`, committing the first strategy that succeeds.
//! Each strategy is a free function taking an immutable ledger snapshot and
//! returning a provisional plan rather than mutating state directly — the
//! caller (`schedule_one_task`) is the only place that calls
//! `ledger.commit`, so "abort and try the next strategy" (§4.4.4) is pure
//! `Option` chaining (`.or_else`) rather than rollback logic. Mirrors the
//! teacher's `ResourceTimeline::find_available_slot` returning a candidate
//! without mutating the timeline itself.

use crate::availability::{build_availability, horizon_dates};
use crate::ledger::OccupancyLedger;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use taskslot_core::{AvailableBlock, CancellationToken, Clock, Instance, SchedulerConfig, ScheduledSlot, Task, TaskId, UserId};

#[derive(Debug)]
pub struct GreedyOutcome {
    pub ledger: OccupancyLedger,
    pub scheduled: HashMap<TaskId, Vec<ScheduledSlot>>,
    pub failures: HashMap<TaskId, String>,
    pub horizon_days: u32,
    pub horizon_extensions: u32,
    pub d0: NaiveDate,
}

impl GreedyOutcome {
    pub fn success_rate(&self, total_tasks: usize) -> f64 {
        if total_tasks == 0 {
            1.0
        } else {
            self.scheduled.len() as f64 / total_tasks as f64
        }
    }
}

/// §4.4.1: composite sort key, first-listed has highest precedence.
pub fn order_tasks(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then_with(|| a.hierarchy_level_or_leaf().cmp(&b.hierarchy_level_or_leaf()))
            .then_with(|| b.is_leaf().cmp(&a.is_leaf()))
            .then_with(|| b.remaining_hours.total_cmp(&a.remaining_hours))
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

/// §4.4.2: initial horizon grown to cover each user's own worst-case need.
pub fn initial_horizon(instance: &Instance, config: &SchedulerConfig) -> u32 {
    let mut per_user_hours: HashMap<UserId, f64> = HashMap::new();
    for task in &instance.tasks {
        *per_user_hours.entry(task.user_id).or_insert(0.0) += task.remaining_hours.max(0.0);
    }
    let max_days_with_buffer = per_user_hours
        .values()
        .map(|&hours| {
            let weeks_needed = (hours / 40.0).ceil().max(0.0);
            let days_needed = weeks_needed * 7.0;
            (days_needed * 1.5).floor() as u32
        })
        .max()
        .unwrap_or(0);
    config
        .initial_horizon_days
        .max(max_days_with_buffer)
        .min(config.max_horizon_days)
}

/// Run one full greedy pass, extending the horizon and retrying (capped at
/// 5 extensions) until `success_rate >= 0.8` or the horizon is exhausted
/// (§4.4.5).
pub fn run_greedy(instance: &Instance, clock: &dyn Clock, config: &SchedulerConfig) -> GreedyOutcome {
    run_greedy_cancellable(instance, clock, config, None)
}

/// Same as [`run_greedy`] but checks `token` between horizon attempts and
/// between individual task placements, returning whatever has been
/// committed so far the moment cancellation is observed rather than
/// continuing to the configured stopping condition.
pub fn run_greedy_cancellable(
    instance: &Instance,
    clock: &dyn Clock,
    config: &SchedulerConfig,
    token: Option<&CancellationToken>,
) -> GreedyOutcome {
    let d0 = clock.first_planning_day();
    let ordered = order_tasks(&instance.tasks);
    let total_tasks = ordered.len();
    let mut horizon = initial_horizon(instance, config);
    let mut extensions = 0u32;

    loop {
        let span = tracing::info_span!("greedy_pass", horizon_days = horizon, extensions);
        let _enter = span.enter();

        let availability = build_availability(instance, d0, horizon);
        let mut ledger = OccupancyLedger::new();
        let dates = horizon_dates(d0, horizon);
        ledger.seed(instance.distinct_users(), &dates);

        let mut scheduled = HashMap::new();
        let mut failures = HashMap::new();
        for task in &ordered {
            if token.is_some_and(CancellationToken::is_cancelled) {
                tracing::info!("greedy: cancellation observed, returning partial result");
                return GreedyOutcome {
                    ledger,
                    scheduled,
                    failures,
                    horizon_days: horizon,
                    horizon_extensions: extensions,
                    d0,
                };
            }
            let blocks = availability.blocks_for(task.user_id);
            match schedule_one_task(task, blocks, &ledger) {
                Some(slots) => {
                    ledger.commit(&slots);
                    scheduled.insert(task.id, slots);
                }
                None => {
                    let free_hours = availability.total_free_hours(task.user_id);
                    tracing::debug!(
                        task_id = task.id.0,
                        user_id = task.user_id.0,
                        blocks_available = blocks.len(),
                        free_hours_total = free_hours,
                        "greedy: no placement strategy succeeded for task"
                    );
                    failures.insert(
                        task.id,
                        format!(
                            "{} available block(s) totalling {} free hour(s), needed {}",
                            blocks.len(),
                            free_hours,
                            task.hours_needed()
                        ),
                    );
                }
            }
        }

        let success_rate = if total_tasks == 0 {
            1.0
        } else {
            scheduled.len() as f64 / total_tasks as f64
        };

        if success_rate >= 0.8 || horizon >= config.max_horizon_days || extensions >= 5 {
            return GreedyOutcome {
                ledger,
                scheduled,
                failures,
                horizon_days: horizon,
                horizon_extensions: extensions,
                d0,
            };
        }

        let next_horizon = (horizon.saturating_mul(2)).min(config.max_horizon_days);
        tracing::debug!(from = horizon, to = next_horizon, "greedy: extending horizon");
        horizon = next_horizon;
        extensions += 1;
    }
}

fn schedule_one_task(
    task: &Task,
    blocks: &[AvailableBlock],
    ledger: &OccupancyLedger,
) -> Option<Vec<ScheduledSlot>> {
    let hours_needed = task.hours_needed();
    if hours_needed == 0 {
        return Some(Vec::new());
    }
    try_single_day_consecutive(task, blocks, ledger, hours_needed)
        .or_else(|| try_multi_day_consecutive(task, blocks, ledger, hours_needed))
        .or_else(|| {
            (hours_needed > 8).then(|| try_flexible_limited_gaps(task, blocks, ledger, hours_needed)).flatten()
        })
        .or_else(|| {
            (hours_needed > 16)
                .then(|| try_multi_week_distribution(task, blocks, ledger, hours_needed))
                .flatten()
        })
}

fn free_hours_in_block(block: &AvailableBlock, ledger: &OccupancyLedger, user: UserId) -> Vec<u8> {
    block
        .hours()
        .filter(|&h| ledger.is_free(user, block.date, h))
        .collect()
}

fn longest_consecutive_run(hours: &[u8]) -> Vec<u8> {
    let mut best: Vec<u8> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    for &h in hours {
        match current.last() {
            Some(&last) if h == last + 1 => current.push(h),
            _ => {
                if current.len() > best.len() {
                    best = current.clone();
                }
                current = vec![h];
            }
        }
    }
    if current.len() > best.len() {
        best = current;
    }
    best
}

/// Collect a chain starting from the earliest free hour, stopping the
/// moment the gap to the next candidate exceeds 2 hours (not skipping past
/// it) — confirmed by `greedy_model.py`'s per-day scan behavior.
fn stitch_with_gap_limit(hours: &[u8]) -> Vec<u8> {
    let mut chain: Vec<u8> = match hours.first() {
        Some(&h) => vec![h],
        None => return Vec::new(),
    };
    for &h in &hours[1..] {
        let last = *chain.last().unwrap();
        let gap = h.saturating_sub(last).saturating_sub(1);
        if gap > 2 {
            break;
        }
        chain.push(h);
    }
    chain
}

fn make_slots(task: &Task, picks: &[(NaiveDate, u8)]) -> Vec<ScheduledSlot> {
    picks
        .iter()
        .map(|&(date, hour)| ScheduledSlot {
            task_id: task.id,
            user_id: task.user_id,
            date,
            hour,
        })
        .collect()
}

/// Strategy 1 (§4.4.3.1): scan blocks ascending by start; within each block
/// whose raw duration is at least `h`, find the longest run of consecutive
/// free hours; take the first `h` of that run if it suffices.
fn try_single_day_consecutive(
    task: &Task,
    blocks: &[AvailableBlock],
    ledger: &OccupancyLedger,
    hours_needed: u32,
) -> Option<Vec<ScheduledSlot>> {
    let h = hours_needed as usize;
    for block in blocks {
        if u32::from(block.duration_hours()) < hours_needed {
            continue;
        }
        let free = free_hours_in_block(block, ledger, task.user_id);
        let run = longest_consecutive_run(&free);
        if run.len() >= h {
            let picks: Vec<(NaiveDate, u8)> = run[..h].iter().map(|&hr| (block.date, hr)).collect();
            return Some(make_slots(task, &picks));
        }
    }
    None
}

/// Strategy 2 (§4.4.3.2): walk blocks chronologically, greedily appending
/// free hours in ascending order within each block until `h` are
/// collected. No gap limit across blocks or days.
fn try_multi_day_consecutive(
    task: &Task,
    blocks: &[AvailableBlock],
    ledger: &OccupancyLedger,
    hours_needed: u32,
) -> Option<Vec<ScheduledSlot>> {
    let h = hours_needed as usize;
    let mut picks: Vec<(NaiveDate, u8)> = Vec::new();
    for block in blocks {
        for hr in free_hours_in_block(block, ledger, task.user_id) {
            picks.push((block.date, hr));
            if picks.len() == h {
                return Some(make_slots(task, &picks));
            }
        }
    }
    None
}

/// Strategy 3 (§4.4.3.3, only if `hours_needed > 8`): per day, try the best
/// consecutive run first; if that alone doesn't cover what's still needed,
/// stitch the day's free hours with a <=2-hour gap tolerance; accumulate
/// across days in chronological order until `h` hours are collected.
fn try_flexible_limited_gaps(
    task: &Task,
    blocks: &[AvailableBlock],
    ledger: &OccupancyLedger,
    hours_needed: u32,
) -> Option<Vec<ScheduledSlot>> {
    let h = hours_needed as usize;
    let mut by_day: BTreeMap<NaiveDate, Vec<&AvailableBlock>> = BTreeMap::new();
    for block in blocks {
        by_day.entry(block.date).or_default().push(block);
    }

    let mut picks: Vec<(NaiveDate, u8)> = Vec::new();
    for (date, day_blocks) in &by_day {
        let mut day_free: Vec<u8> = day_blocks
            .iter()
            .flat_map(|b| free_hours_in_block(b, ledger, task.user_id))
            .collect();
        day_free.sort_unstable();
        day_free.dedup();

        let remaining = h - picks.len();
        let run = longest_consecutive_run(&day_free);
        let chosen: Vec<u8> = if run.len() >= remaining {
            run[..remaining].to_vec()
        } else {
            let stitched = stitch_with_gap_limit(&day_free);
            stitched.into_iter().take(remaining).collect()
        };
        picks.extend(chosen.into_iter().map(|hr| (*date, hr)));
        if picks.len() == h {
            return Some(make_slots(task, &picks));
        }
    }
    None
}

/// Strategy 4 (§4.4.3.4, only if `hours_needed > 16`): group free hours by
/// ISO calendar week; take up to 8 hours per week, in chronological order,
/// until `h` are collected.
fn try_multi_week_distribution(
    task: &Task,
    blocks: &[AvailableBlock],
    ledger: &OccupancyLedger,
    hours_needed: u32,
) -> Option<Vec<ScheduledSlot>> {
    let h = hours_needed as usize;
    let mut by_week: BTreeMap<(i32, u32), Vec<(NaiveDate, u8)>> = BTreeMap::new();
    for block in blocks {
        let iso = block.date.iso_week();
        let key = (iso.year(), iso.week());
        let entry = by_week.entry(key).or_default();
        for hr in free_hours_in_block(block, ledger, task.user_id) {
            entry.push((block.date, hr));
        }
    }
    for hours in by_week.values_mut() {
        hours.sort_unstable();
    }

    let mut picks: Vec<(NaiveDate, u8)> = Vec::new();
    for hours in by_week.values() {
        let take = hours.iter().take(8);
        for &(date, hr) in take {
            picks.push((date, hr));
            if picks.len() == h {
                return Some(make_slots(task, &picks));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskslot_core::{CalendarSlot, FixedClock, Instance, Leave, TaskId, UserId};

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

    #[test]
    fn ordering_respects_priority_then_tiebreaks() {
        let tasks = vec![task(2, 1, 2.0, 10.0), task(1, 1, 2.0, 50.0), task(3, 1, 2.0, 50.0)];
        let ordered = order_tasks(&tasks);
        assert_eq!(ordered[0].id, TaskId(1));
        assert_eq!(ordered[1].id, TaskId(3));
        assert_eq!(ordered[2].id, TaskId(2));
    }

    #[test]
    fn single_day_consecutive_places_short_task() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = Instance::new(vec![task(1, 1, 2.0, 10.0)], mon_fri_9_5(1), vec![]);
        let outcome = run_greedy(&instance, &FixedClock(d0 - chrono::Duration::days(1)), &SchedulerConfig::default());
        let slots = outcome.scheduled.get(&TaskId(1)).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].hour, 9);
        assert_eq!(slots[1].hour, 10);
    }

    #[test]
    fn long_task_spreads_across_days() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = Instance::new(vec![task(1, 1, 60.0, 10.0)], mon_fri_9_5(1), vec![]);
        let outcome = run_greedy(&instance, &FixedClock(d0 - chrono::Duration::days(1)), &SchedulerConfig::default());
        let slots = outcome.scheduled.get(&TaskId(1)).unwrap();
        assert_eq!(slots.len(), 60);
        let days: std::collections::HashSet<_> = slots.iter().map(|s| s.date).collect();
        assert!(days.len() >= 8, "60 hours at 8h/day across Mon-Fri needs multiple weeks");
        for day in &days {
            let hours: Vec<u8> = slots.iter().filter(|s| s.date == *day).map(|s| s.hour).collect();
            assert!(hours.len() <= 8);
        }
    }

    #[test]
    fn zero_hour_task_is_trivially_scheduled() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = Instance::new(vec![task(1, 1, 0.0, 10.0)], mon_fri_9_5(1), vec![]);
        let outcome = run_greedy(&instance, &FixedClock(d0 - chrono::Duration::days(1)), &SchedulerConfig::default());
        assert_eq!(outcome.scheduled.get(&TaskId(1)).unwrap().len(), 0);
    }

    #[test]
    fn no_calendar_means_unschedulable_but_not_fatal() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = Instance::new(vec![task(1, 1, 2.0, 10.0)], vec![], vec![]);
        let outcome = run_greedy(&instance, &FixedClock(d0 - chrono::Duration::days(1)), &SchedulerConfig::default());
        assert!(outcome.scheduled.get(&TaskId(1)).is_none());
        assert!(outcome.failures.contains_key(&TaskId(1)));
    }

    #[test]
    fn determinism_same_inputs_same_output() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut slots = mon_fri_9_5(1);
        slots.extend(mon_fri_9_5(2));
        let tasks = vec![
            task(1, 1, 5.0, 40.0),
            task(2, 2, 3.0, 20.0),
            task(3, 1, 1.0, 90.0),
        ];
        let instance = Instance::new(tasks, slots, vec![]);
        let clock = FixedClock(d0 - chrono::Duration::days(1));
        let a = run_greedy(&instance, &clock, &SchedulerConfig::default());
        let b = run_greedy(&instance, &clock, &SchedulerConfig::default());
        let mut a_tasks: Vec<_> = a.scheduled.iter().collect();
        let mut b_tasks: Vec<_> = b.scheduled.iter().collect();
        a_tasks.sort_by_key(|(id, _)| **id);
        b_tasks.sort_by_key(|(id, _)| **id);
        assert_eq!(a_tasks, b_tasks);
    }

    #[test]
    fn pre_cancelled_token_stops_before_any_placement() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let instance = Instance::new(vec![task(1, 1, 2.0, 10.0)], mon_fri_9_5(1), vec![]);
        let token = taskslot_core::CancellationToken::new();
        token.cancel();
        let outcome = run_greedy_cancellable(
            &instance,
            &FixedClock(d0 - chrono::Duration::days(1)),
            &SchedulerConfig::default(),
            Some(&token),
        );
        assert!(outcome.scheduled.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn leave_blocks_entire_week() {
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(); // Monday
        let week_end = d0 + chrono::Duration::days(6);
        let instance = Instance::new(
            vec![task(1, 1, 4.0, 10.0)],
            mon_fri_9_5(1),
            vec![Leave {
                task_id: TaskId(1),
                date_from: d0,
                date_to: week_end,
            }],
        );
        let outcome = run_greedy(&instance, &FixedClock(d0 - chrono::Duration::days(1)), &SchedulerConfig::default());
        let slots = outcome.scheduled.get(&TaskId(1)).unwrap();
        assert!(slots.iter().all(|s| s.date > week_end));
    }
}
