//! `ScheduleError` — the only error a caller of `taskslot_solver::schedule`
//! can receive. Grounded on `utf8proj-core::ScheduleError`'s own shape
//! (`#[error("...")] VariantName(Field)` per kind).
//!
//! Per spec.md §7 and §9 ("error returns vs exceptions"), `ResourceShortage`,
//! `SolverTimeout`/`SolverInfeasible`/`HorizonExhausted` are *not* variants
//! here — they are domain outcomes recorded on the produced `Solution`
//! (`TaskOutcome::Unscheduled`, `SolutionStatus::Partial`/`Failed`), not
//! thrown errors. Only an `InputError` aborts the call before any solving
//! begins; `InternalInvariantViolation` is the one condition additionally
//! allowed to `panic!` from deep inside `OccupancyLedger::commit` — this
//! variant exists for the case the panic is caught and reported by the
//! post-solve validator instead of unwinding past it.

use crate::TaskId;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    #[error("task {task_id} has negative remaining_hours: {remaining_hours}")]
    NegativeRemainingHours { task_id: TaskId, remaining_hours: f64 },

    #[error("task {task_id} has a non-finite priority_score")]
    NonFinitePriorityScore { task_id: TaskId },

    #[error("calendar slot for task {task_id} has hour_from ({hour_from}) >= hour_to ({hour_to}) or is out of range")]
    InvalidHourRange {
        task_id: TaskId,
        hour_from: u8,
        hour_to: u8,
    },

    #[error("leave for task {task_id} has date_from ({date_from}) after date_to ({date_to})")]
    MalformedDateRange {
        task_id: TaskId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    },

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}
