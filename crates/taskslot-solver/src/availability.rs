//! Availability Builder (spec.md §4.2).
//!
//! Turns a user's weekly calendar pattern plus the horizon plus leaves into
//! a sorted vector of [`AvailableBlock`]s per user. Both the greedy and CP
//! paths call this same function so the per-user leave union (§9 resolved
//! Open Question) cannot diverge between them, grounded on
//! `greedy_model.py::_prepare_available_slots`/`_prepare_leaves`'s exact
//! iteration order (groupby-first dedup).

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use std::collections::{HashMap, HashSet};
use taskslot_core::{AvailableBlock, Instance, Leave, TaskId, UserId};

/// Per-user, sorted-ascending `AvailableBlock` vectors for one horizon.
#[derive(Debug, Default, Clone)]
pub struct AvailabilityMap {
    blocks: HashMap<UserId, Vec<AvailableBlock>>,
}

impl AvailabilityMap {
    pub fn blocks_for(&self, user: UserId) -> &[AvailableBlock] {
        self.blocks.get(&user).map_or(&[], Vec::as_slice)
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.blocks.keys().copied()
    }

    pub fn total_free_hours(&self, user: UserId) -> u64 {
        self.blocks_for(user)
            .iter()
            .map(|b| u64::from(b.duration_hours()))
            .sum()
    }
}

/// Build the per-user availability for a `D`-day horizon starting at `d0`
/// (`d0` is normally `clock.first_planning_day()`).
pub fn build_availability(instance: &Instance, d0: NaiveDate, horizon_days: u32) -> AvailabilityMap {
    let mut weekly_patterns: HashMap<UserId, HashSet<(u8, u8, u8)>> = HashMap::new();
    let task_user = task_user_map(instance);
    for slot in &instance.calendar_slots {
        if let Some(&user) = task_user.get(&slot.task_id) {
            weekly_patterns
                .entry(user)
                .or_default()
                .insert((slot.dayofweek, slot.hour_from, slot.hour_to));
        }
    }

    let leaves_by_user = leaves_per_user(&instance.leaves, &task_user);

    let mut blocks: HashMap<UserId, Vec<AvailableBlock>> = HashMap::new();
    for (&user, patterns) in &weekly_patterns {
        let user_leaves = leaves_by_user.get(&user).cloned().unwrap_or_default();
        let mut user_blocks = Vec::new();
        for offset in 0..u64::from(horizon_days) {
            let date = d0 + ChronoDuration::days(offset as i64);
            let weekday = monday_indexed_weekday(date);
            for &(dayofweek, hour_from, hour_to) in patterns {
                if dayofweek != weekday {
                    continue;
                }
                if hour_to <= hour_from {
                    continue;
                }
                if user_leaves.iter().any(|l| l.contains(date)) {
                    continue;
                }
                user_blocks.push(AvailableBlock {
                    user_id: user,
                    date,
                    hour_from,
                    hour_to,
                    weekday,
                });
            }
        }
        user_blocks.sort_by_key(|b| (b.date, b.hour_from));
        blocks.insert(user, user_blocks);
    }

    AvailabilityMap { blocks }
}

/// Every user's calendar dates in `[d0, d0+D)`, even users with zero
/// matching blocks on a given day — used by the Occupancy Ledger to
/// pre-seed an empty hour-set for every calendar date (§4.2).
pub fn horizon_dates(d0: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    (0..u64::from(horizon_days))
        .map(|offset| d0 + ChronoDuration::days(offset as i64))
        .collect()
}

/// 0 = Monday .. 6 = Sunday, matching spec.md's `dayofweek` convention
/// (chrono's `Weekday::num_days_from_monday` already agrees with this).
pub fn monday_indexed_weekday(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Every task's owning user. Shared by both the Greedy and CP paths so
/// neither can diverge on task→user resolution.
pub(crate) fn task_user_map(instance: &Instance) -> HashMap<TaskId, UserId> {
    instance.tasks.iter().map(|t| (t.id, t.user_id)).collect()
}

/// Leaves unioned per user (§9 resolved Open Question): every leave
/// belonging to any task of a user blocks that user's availability,
/// shared verbatim by `build_availability` and `interval::build_contiguous_slots`
/// so the two paths cannot diverge on this rule.
pub(crate) fn leaves_per_user(
    leaves: &[Leave],
    task_user: &HashMap<TaskId, UserId>,
) -> HashMap<UserId, Vec<Leave>> {
    let mut by_user: HashMap<UserId, Vec<Leave>> = HashMap::new();
    for leave in leaves {
        if let Some(&user) = task_user.get(&leave.task_id) {
            by_user.entry(user).or_default().push(*leave);
        }
    }
    by_user
}
