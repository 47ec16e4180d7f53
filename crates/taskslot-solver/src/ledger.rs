//! Occupancy Ledger (spec.md §4.3).
//!
//! Per-user, per-date set of already-committed hour integers. Grounded on
//! `utf8proj-solver::leveling::ResourceTimeline`'s per-resource,
//! day-keyed usage map (`add_usage`/`remove_usage`/`find_available_slot`),
//! generalized from "minutes of effort per day" to "set of committed hour
//! integers per day" as spec.md §3 requires.
//!
//! The sole mutable shared state within one scheduling job (§5); owned by
//! the greedy pass for the lifetime of one solve attempt and mutated only
//! from the single scheduling thread, so no locking is required.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use taskslot_core::{ScheduledSlot, UserId};

#[derive(Debug, Default, Clone)]
pub struct OccupancyLedger {
    occupied: HashMap<UserId, HashMap<NaiveDate, HashSet<u8>>>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an empty hour-set for every `(user, date)` pair in the horizon,
    /// even dates with no matching calendar blocks (§4.2).
    pub fn seed(&mut self, users: impl IntoIterator<Item = UserId>, dates: &[NaiveDate]) {
        for user in users {
            let per_date = self.occupied.entry(user).or_default();
            for &date in dates {
                per_date.entry(date).or_default();
            }
        }
    }

    pub fn is_free(&self, user: UserId, date: NaiveDate, hour: u8) -> bool {
        !self
            .occupied
            .get(&user)
            .and_then(|by_date| by_date.get(&date))
            .is_some_and(|hours| hours.contains(&hour))
    }

    /// Commit a provisional plan, all-or-nothing. Every slot must already
    /// be free; calling this with an occupied slot is a programmer error
    /// (the caller must pre-filter with `is_free`/the placement strategies)
    /// and is therefore an `InternalInvariantViolation`: this function
    /// panics rather than silently overwrite or partially commit.
    pub fn commit(&mut self, slots: &[ScheduledSlot]) {
        for slot in slots {
            if !self.is_free(slot.user_id, slot.date, slot.hour) {
                panic!(
                    "InternalInvariantViolation: attempted to commit already-occupied slot \
                     (user={}, date={}, hour={})",
                    slot.user_id, slot.date, slot.hour
                );
            }
        }
        for slot in slots {
            self.occupied
                .entry(slot.user_id)
                .or_default()
                .entry(slot.date)
                .or_default()
                .insert(slot.hour);
        }
    }

    /// Drop all committed state. Used when the horizon is regenerated
    /// (§4.4.5 retry loop): availability and ledger are rebuilt together,
    /// never merely appended to.
    pub fn reset(&mut self) {
        self.occupied.clear();
    }
}
