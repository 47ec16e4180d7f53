//! Caller-owned clock abstraction.
//!
//! The first planning day is always *tomorrow, UTC*. Every component that
//! needs "now" takes a `&dyn Clock` rather than calling `Utc::now()`
//! directly, the same way the teacher isolates date-literal logic from real
//! time in its own test fixtures — this is what makes the future-only
//! property (§8 property 5) and greedy determinism (§8 property 7)
//! testable without wall-clock flakiness.

use chrono::{Duration, NaiveDate, Utc};

/// Supplies the current UTC date.
pub trait Clock: Send + Sync {
    fn today_utc(&self) -> NaiveDate;

    /// The first day of any planning horizon: tomorrow, UTC.
    fn first_planning_day(&self) -> NaiveDate {
        self.today_utc() + Duration::days(1)
    }
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_utc(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Test double returning a constant date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today_utc(&self) -> NaiveDate {
        self.0
    }
}
