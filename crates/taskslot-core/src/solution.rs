//! The `Solution` produced by `taskslot_solver::schedule`, and its
//! supporting statistics types. Mirrors how the teacher's own `Schedule`
//! struct separates the assignment map from a side statistics struct.

use crate::{ScheduledSlot, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Optimal,
    Feasible,
    Infeasible,
    Partial,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Greedy,
    Ortools,
    OrtoolsFallback,
}

/// Per-task result: either a list of committed slots, or the reason it
/// could not be (fully) scheduled. `ResourceShortage` (§7) is represented
/// here, not as a thrown error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TaskOutcome {
    Scheduled,
    Unscheduled { reason: String },
}

/// Solve-level statistics, separate from the per-task assignment map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SolveStats {
    pub horizon_extensions: u32,
    /// Must be 0 for a valid solution; any non-zero value means the
    /// post-solve validator found an `InternalInvariantViolation`.
    pub overlaps_detected: u32,
    #[serde(with = "duration_seconds")]
    pub execution_time: Duration,
    /// CP-only. `None` on a pure-greedy solution.
    pub objective_value: Option<f64>,
    pub num_branches: Option<u64>,
    pub num_conflicts: Option<u64>,
    pub num_booleans: Option<u64>,
    pub num_constraints: Option<u64>,
}

mod duration_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

/// The final output of one `schedule(...)` call. `stats` is flattened so
/// the persisted JSON carries every status/statistics field (§6) at the
/// top level rather than nested under a `"stats"` key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Solution {
    /// Committed slots per task, in chronological order.
    pub tasks: HashMap<TaskId, Vec<ScheduledSlot>>,
    pub outcomes: HashMap<TaskId, TaskOutcome>,
    pub status: SolutionStatus,
    pub algorithm_used: Algorithm,
    pub tasks_scheduled: u32,
    pub tasks_total: u32,
    /// `tasks_scheduled / tasks_total`, computed once by the orchestrator
    /// and carried on the value rather than recomputed by every caller.
    pub success_rate: f64,
    pub horizon_days: u32,
    #[serde(flatten)]
    pub stats: SolveStats,
}
