//! Post-solve validation (spec.md §4.4.6 / §4.5.6 / §8 property 2).
//!
//! Scans the final committed slots grouped by user and `(date, hour)`.
//! Any collision is an `InternalInvariantViolation` — the correctness
//! contract is that `overlaps_detected` is always 0 on a returned
//! `Solution`; this function is what computes that count without relying
//! on the ledger panic path having fired (the ledger's `commit` already
//! refuses to double-book, but CP-path slots and merged residual fill-in
//! slots never pass through the ledger, so this scan is the single source
//! of truth for the reported statistic).

use std::collections::HashMap;
use taskslot_core::{ScheduledSlot, TaskId};

/// Count of `(user, date, hour)` triples occupied by more than one
/// committed slot, summed across all excess occupants.
pub fn count_overlaps<'a>(all_slots: impl IntoIterator<Item = &'a ScheduledSlot>) -> u32 {
    let mut seen: HashMap<(taskslot_core::UserId, chrono::NaiveDate, u8), u32> = HashMap::new();
    for slot in all_slots {
        *seen.entry((slot.user_id, slot.date, slot.hour)).or_insert(0) += 1;
    }
    seen.values().filter(|&&count| count > 1).map(|&count| count - 1).sum()
}

/// §8 property 1: every scheduled task's slot count equals
/// `ceil(remaining_hours)`.
pub fn hour_coverage_holds(scheduled: &HashMap<TaskId, Vec<ScheduledSlot>>, expected_hours: &HashMap<TaskId, u32>) -> bool {
    scheduled.iter().all(|(id, slots)| {
        expected_hours
            .get(id)
            .is_some_and(|&expected| slots.len() as u32 == expected)
    })
}
