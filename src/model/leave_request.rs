use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::leave::overlap::DateSpan;

#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 3)]
    pub user_id: u64,
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family visit")]
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub created_at: NaiveDate,
    /// inclusive day count between start_date and end_date
    #[schema(example = 3)]
    pub days: i32,
}

impl LeaveRequest {
    pub fn span(&self) -> DateSpan {
        DateSpan::new(self.start_date, self.end_date)
    }
}

/// A leave joined with the fields of its owner that reporting needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveWithOwner {
    #[serde(flatten)]
    pub leave: LeaveRequest,
    #[schema(example = "John Doe")]
    pub username: String,
    #[schema(example = "Front Desk")]
    pub department: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn record(&mut self, status: LeaveStatus, count: i64) {
        match status {
            LeaveStatus::Pending => self.pending += count,
            LeaveStatus::Approved => self.approved += count,
            LeaveStatus::Rejected => self.rejected += count,
        }
        self.total += count;
    }
}
