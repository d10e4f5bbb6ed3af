use chrono::NaiveDate;

use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::user::User;

use super::overlap::DateSpan;

pub const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("insufficient leave balance: {requested} day(s) requested, {balance} left")]
    InsufficientBalance { requested: i32, balance: i32 },
    #[error("reason must be at most 500 characters")]
    ReasonTooLong,
}

/// Checks a proposed leave for `user` and builds the Pending request.
///
/// The returned request has id 0 and is not persisted; the user's balance is
/// only read here; it changes when the request is approved.
pub fn validate_and_build(
    user: &User,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: &str,
    created_at: NaiveDate,
) -> Result<LeaveRequest, ValidationError> {
    if end_date < start_date {
        return Err(ValidationError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }

    // an empty reason is accepted
    let reason = reason.trim();
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::ReasonTooLong);
    }

    let days = DateSpan::new(start_date, end_date).days();
    if days > i64::from(user.leave_balance) {
        return Err(ValidationError::InsufficientBalance {
            requested: i32::try_from(days).unwrap_or(i32::MAX),
            balance: user.leave_balance,
        });
    }

    Ok(LeaveRequest {
        id: 0,
        user_id: user.id,
        start_date,
        end_date,
        reason: reason.to_string(),
        status: LeaveStatus::Pending,
        created_at,
        // bounded by leave_balance above
        days: days as i32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
    }

    fn staff(balance: i32) -> User {
        User {
            id: 7,
            username: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            department: "Front Desk".to_string(),
            leave_balance: balance,
            active: true,
        }
    }

    #[test]
    fn builds_pending_request_with_inclusive_days() {
        let user = staff(21);
        let leave = validate_and_build(&user, date(3, 10), date(3, 12), "Family visit", date(3, 1))
            .expect("valid request");

        assert_eq!(leave.days, 3);
        assert_eq!(leave.status, LeaveStatus::Pending);
        assert_eq!(leave.user_id, 7);
        assert_eq!(leave.created_at, date(3, 1));
        assert_eq!(user.leave_balance, 21);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = validate_and_build(&staff(21), date(3, 12), date(3, 10), "x", date(3, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDateRange {
                start: date(3, 12),
                end: date(3, 10)
            }
        );
    }

    #[test]
    fn rejects_more_days_than_balance() {
        let err = validate_and_build(&staff(10), date(3, 1), date(3, 31), "Trip", date(2, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientBalance {
                requested: 31,
                balance: 10
            }
        );
    }

    #[test]
    fn whole_balance_can_be_requested() {
        let leave = validate_and_build(&staff(3), date(3, 10), date(3, 12), "Trip", date(3, 1))
            .expect("exact balance is enough");
        assert_eq!(leave.days, 3);
    }

    #[test]
    fn reason_is_trimmed_and_capped() {
        let blank = validate_and_build(&staff(21), date(3, 10), date(3, 12), "", date(3, 1))
            .expect("empty reason is fine");
        assert_eq!(blank.reason, "");
        assert_eq!(blank.days, 3);

        let spaces = validate_and_build(&staff(21), date(3, 10), date(3, 10), "   ", date(3, 1))
            .expect("whitespace reason is fine");
        assert_eq!(spaces.reason, "");

        let leave = validate_and_build(&staff(21), date(3, 10), date(3, 10), "  Dentist ", date(3, 1))
            .expect("valid request");
        assert_eq!(leave.reason, "Dentist");

        let long = "a".repeat(MAX_REASON_LEN + 1);
        assert_eq!(
            validate_and_build(&staff(21), date(3, 10), date(3, 10), &long, date(3, 1)),
            Err(ValidationError::ReasonTooLong)
        );
    }
}
