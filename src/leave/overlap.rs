use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed date interval `[start, end]`, both days included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Inclusive number of calendar days, 1 for a single-day span.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// True when the two spans share at least one day. Touching boundaries count.
///
/// Every span overlaps itself; callers comparing a collection must skip
/// self-comparison.
pub fn overlaps(a: &DateSpan, b: &DateSpan) -> bool {
    !(a.end < b.start || a.start > b.end)
}
