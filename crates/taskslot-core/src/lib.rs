//! # taskslot-core
//!
//! Domain model, clock abstraction, configuration and error taxonomy for the
//! `taskslot` hybrid hourly scheduling engine.
//!
//! This crate provides:
//! - Domain types: `Task`, `CalendarSlot`, `Leave`, `AvailableBlock`, `ScheduledSlot`
//! - `Solution` and its statistics (`SolveStats`, `SolutionStatus`, `Algorithm`)
//! - The `Clock` trait (`SystemClock` / `FixedClock`)
//! - `CancellationToken`, a cooperative stop flag a caller can hand into a solve
//! - `SchedulerConfig` with the router thresholds and horizon parameters
//! - `ScheduleError`, the only error type this crate's callers can receive
//!   from the public `schedule` entry point in `taskslot-solver`
//!
//! It has no scheduling logic of its own — that lives in `taskslot-solver`,
//! which depends on this crate for the shared vocabulary both the greedy and
//! CP paths speak.

mod cancellation;
mod clock;
mod config;
mod error;
mod solution;

pub use cancellation::CancellationToken;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SchedulerConfig;
pub use error::ScheduleError;
pub use solution::{Algorithm, Solution, SolutionStatus, SolveStats, TaskOutcome};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stable identifier for a [`Task`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the resource (user) that owns a [`Task`] and its calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work owned by a single user, requiring `remaining_hours` of
/// effort before the horizon ends.
///
/// `priority_score` is a real number where *higher means more urgent* — the
/// convention the greedy ordering uses (§4.4.1). The CP objective in
/// `taskslot-solver::interval` intentionally inverts this convention for its
/// own earliness weighting; see that module's `priority_weight` doc comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub user_id: UserId,
    /// Positive real number of hours of work remaining. Scheduling always
    /// works in integer hours via [`Task::hours_needed`], computed once per
    /// solve rather than re-derived ad hoc at each call site.
    pub remaining_hours: f64,
    /// Higher = more urgent.
    pub priority_score: f64,
    /// 0 = leaf. `None` is treated as a leaf task (hierarchy_level 0).
    pub hierarchy_level: Option<u32>,
    /// Defaults to `true` when absent.
    pub is_leaf_task: Option<bool>,
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// `ceil(remaining_hours)`, clamped to `>= 0`. The single accessor every
    /// scheduling computation must use so that §8 property 1 ("number of
    /// emitted slots equals `ceil(remaining_hours)`") holds exactly.
    pub fn hours_needed(&self) -> u32 {
        if self.remaining_hours <= 0.0 {
            0
        } else {
            self.remaining_hours.ceil() as u32
        }
    }

    pub fn hierarchy_level_or_leaf(&self) -> u32 {
        self.hierarchy_level.unwrap_or(0)
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf_task.unwrap_or(true)
    }
}

/// A weekly-recurring window of availability declared against a task, which
/// inherits to its owning user (tasks of the same user may duplicate the
/// same triple; callers deduplicate on `(dayofweek, hour_from, hour_to)`
/// before building availability).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarSlot {
    pub task_id: TaskId,
    /// 0 = Monday .. 6 = Sunday.
    pub dayofweek: u8,
    pub hour_from: u8,
    pub hour_to: u8,
}

impl CalendarSlot {
    pub fn is_valid(&self) -> bool {
        self.dayofweek <= 6 && self.hour_from < self.hour_to && self.hour_to <= 24
    }
}

/// An inclusive absence window for the user owning `task_id`. Per the
/// resolved Open Question (spec.md §9 / SPEC_FULL.md §4.2), leaves are
/// unioned **per user**: every leave belonging to any task of a user blocks
/// that user's availability, not just the declaring task's own slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    pub task_id: TaskId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl Leave {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to
    }
}

/// A contiguous hour-range on a single date for one user, derived from a
/// user's calendar slots with leave days removed. Immutable; rebuilt
/// whenever the horizon is regenerated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableBlock {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub hour_from: u8,
    pub hour_to: u8,
    /// 0 = Monday .. 6 = Sunday, matching `date.weekday()`.
    pub weekday: u8,
}

impl AvailableBlock {
    pub fn duration_hours(&self) -> u8 {
        self.hour_to.saturating_sub(self.hour_from)
    }

    /// The free hours of this block, in ascending order.
    pub fn hours(&self) -> impl Iterator<Item = u8> {
        self.hour_from..self.hour_to
    }
}

/// One committed hour of a task, for one user, on one date.
///
/// `task_id`/`user_id` make a slot self-describing once pulled out of
/// `Solution::tasks`'s per-task grouping (e.g. `.values().flatten()` in
/// `validate::count_overlaps`) — a superset of the minimal `{date, hour}`
/// per-entry shape described in SPEC_FULL.md §6, not a divergence from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub hour: u8,
}

/// The three caller-owned input sequences bundled together so the
/// `schedule` signature doesn't grow every time a new input kind is added.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Instance {
    pub tasks: Vec<Task>,
    pub calendar_slots: Vec<CalendarSlot>,
    pub leaves: Vec<Leave>,
}

impl Instance {
    pub fn new(tasks: Vec<Task>, calendar_slots: Vec<CalendarSlot>, leaves: Vec<Leave>) -> Self {
        Self {
            tasks,
            calendar_slots,
            leaves,
        }
    }

    pub fn distinct_users(&self) -> HashSet<UserId> {
        self.tasks.iter().map(|t| t.user_id).collect()
    }

    pub fn total_hours(&self) -> f64 {
        self.tasks.iter().map(|t| t.remaining_hours.max(0.0)).sum()
    }

    /// Validate the structural invariants that constitute `InputError`
    /// (§7): duplicate ids, malformed hour ranges, negative effort. Called
    /// once at the top of `taskslot_solver::schedule` before any scheduling
    /// work begins.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id) {
                return Err(ScheduleError::DuplicateTaskId(task.id));
            }
            if task.remaining_hours < 0.0 {
                return Err(ScheduleError::NegativeRemainingHours {
                    task_id: task.id,
                    remaining_hours: task.remaining_hours,
                });
            }
            if !task.priority_score.is_finite() {
                return Err(ScheduleError::NonFinitePriorityScore { task_id: task.id });
            }
        }
        for slot in &self.calendar_slots {
            if !slot.is_valid() {
                return Err(ScheduleError::InvalidHourRange {
                    task_id: slot.task_id,
                    hour_from: slot.hour_from,
                    hour_to: slot.hour_to,
                });
            }
        }
        for leave in &self.leaves {
            if leave.date_from > leave.date_to {
                return Err(ScheduleError::MalformedDateRange {
                    task_id: leave.task_id,
                    date_from: leave.date_from,
                    date_to: leave.date_to,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, user: u64, hours: f64, priority: f64) -> Task {
        Task {
            id: TaskId(id),
            name: format!("task-{id}"),
            user_id: UserId(user),
            remaining_hours: hours,
            priority_score: priority,
            hierarchy_level: None,
            is_leaf_task: None,
            parent_id: None,
        }
    }

    #[test]
    fn hours_needed_rounds_up() {
        let t = task(1, 1, 2.1, 50.0);
        assert_eq!(t.hours_needed(), 3);
    }

    #[test]
    fn hours_needed_zero_when_negative_or_zero() {
        assert_eq!(task(1, 1, 0.0, 1.0).hours_needed(), 0);
    }

    #[test]
    fn leaf_defaults_true() {
        let t = task(1, 1, 1.0, 1.0);
        assert!(t.is_leaf());
        assert_eq!(t.hierarchy_level_or_leaf(), 0);
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let inst = Instance::new(vec![task(1, 1, 1.0, 1.0), task(1, 2, 1.0, 1.0)], vec![], vec![]);
        assert!(matches!(
            inst.validate(),
            Err(ScheduleError::DuplicateTaskId(TaskId(1)))
        ));
    }

    #[test]
    fn validate_rejects_negative_hours() {
        let inst = Instance::new(vec![task(1, 1, -1.0, 1.0)], vec![], vec![]);
        assert!(matches!(
            inst.validate(),
            Err(ScheduleError::NegativeRemainingHours { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_hour_range() {
        let inst = Instance::new(
            vec![task(1, 1, 1.0, 1.0)],
            vec![CalendarSlot {
                task_id: TaskId(1),
                dayofweek: 0,
                hour_from: 10,
                hour_to: 9,
            }],
            vec![],
        );
        assert!(matches!(
            inst.validate(),
            Err(ScheduleError::InvalidHourRange { .. })
        ));
    }
}
