//! Pending -> Approved | Rejected.
//!
//! These functions mutate in-memory values only. They trust the caller to
//! have checked that the acting user is a manager, and they rely on the store
//! to run them inside one transaction so the Pending check and the writes
//! commit together.

use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::user::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("leave request {id} has already been processed ({status})")]
    AlreadyProcessed { id: u64, status: LeaveStatus },
    #[error("insufficient leave balance: {requested} day(s) requested, {balance} left")]
    InsufficientBalance { requested: i32, balance: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// What a successful decision changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transition {
    pub leave_id: u64,
    pub user_id: u64,
    pub status: LeaveStatus,
    /// days taken off the owner's balance, 0 for a rejection
    pub balance_delta: i32,
    pub balance_after: i32,
}

impl Decision {
    /// Applies the decision to `request`, touching `owner` only on approval.
    pub fn apply(
        self,
        request: &mut LeaveRequest,
        owner: &mut User,
    ) -> Result<Transition, LifecycleError> {
        match self {
            Decision::Approve => approve(request, owner),
            Decision::Reject => reject(request).map(|status| Transition {
                leave_id: request.id,
                user_id: request.user_id,
                status,
                balance_delta: 0,
                balance_after: owner.leave_balance,
            }),
        }
    }
}

fn ensure_pending(request: &LeaveRequest) -> Result<(), LifecycleError> {
    if request.status.is_terminal() {
        return Err(LifecycleError::AlreadyProcessed {
            id: request.id,
            status: request.status,
        });
    }
    Ok(())
}

/// Approves a Pending request and charges `owner` for its days.
///
/// Fails with `AlreadyProcessed` when the request is not Pending, and with
/// `InsufficientBalance` when the owner's balance no longer covers it.
pub fn approve(request: &mut LeaveRequest, owner: &mut User) -> Result<Transition, LifecycleError> {
    debug_assert_eq!(request.user_id, owner.id, "owner must match the request");
    ensure_pending(request)?;

    // balance never goes negative; it may have shrunk since the request was filed
    if request.days > owner.leave_balance {
        return Err(LifecycleError::InsufficientBalance {
            requested: request.days,
            balance: owner.leave_balance,
        });
    }

    owner.leave_balance -= request.days;
    request.status = LeaveStatus::Approved;

    Ok(Transition {
        leave_id: request.id,
        user_id: owner.id,
        status: request.status,
        balance_delta: request.days,
        balance_after: owner.leave_balance,
    })
}

pub fn reject(request: &mut LeaveRequest) -> Result<LeaveStatus, LifecycleError> {
    ensure_pending(request)?;
    request.status = LeaveStatus::Rejected;
    Ok(request.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use chrono::NaiveDate;

    fn owner(balance: i32) -> User {
        User {
            id: 3,
            username: "Brandon Kanute".to_string(),
            email: "brandon@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            department: "Front Desk".to_string(),
            leave_balance: balance,
            active: true,
        }
    }

    fn pending(days: i32) -> LeaveRequest {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).expect("valid date");
        LeaveRequest {
            id: 11,
            user_id: 3,
            start_date: start,
            end_date: start + chrono::Duration::days(i64::from(days) - 1),
            reason: "Holiday".to_string(),
            status: LeaveStatus::Pending,
            created_at: start,
            days,
        }
    }

    #[test]
    fn approve_decrements_balance_once() {
        let mut user = owner(21);
        let mut leave = pending(5);

        let transition = approve(&mut leave, &mut user).expect("pending request approves");
        assert_eq!(user.leave_balance, 16);
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert_eq!(transition.balance_delta, 5);
        assert_eq!(transition.balance_after, 16);

        let again = approve(&mut leave, &mut user).unwrap_err();
        assert_eq!(
            again,
            LifecycleError::AlreadyProcessed {
                id: 11,
                status: LeaveStatus::Approved
            }
        );
        assert_eq!(user.leave_balance, 16);
    }

    #[test]
    fn reject_leaves_balance_alone() {
        let mut user = owner(21);
        let mut leave = pending(5);

        let transition = Decision::Reject
            .apply(&mut leave, &mut user)
            .expect("pending request rejects");
        assert_eq!(transition.status, LeaveStatus::Rejected);
        assert_eq!(transition.balance_delta, 0);
        assert_eq!(user.leave_balance, 21);

        assert!(matches!(
            reject(&mut leave),
            Err(LifecycleError::AlreadyProcessed { .. })
        ));
    }

    #[test]
    fn rejected_request_cannot_be_approved() {
        let mut user = owner(21);
        let mut leave = pending(2);
        reject(&mut leave).expect("rejects");

        assert!(Decision::Approve.apply(&mut leave, &mut user).is_err());
        assert_eq!(leave.status, LeaveStatus::Rejected);
        assert_eq!(user.leave_balance, 21);
    }

    #[test]
    fn approve_refuses_when_balance_shrank() {
        let mut user = owner(4);
        let mut leave = pending(5);

        assert_eq!(
            approve(&mut leave, &mut user),
            Err(LifecycleError::InsufficientBalance {
                requested: 5,
                balance: 4
            })
        );
        assert_eq!(leave.status, LeaveStatus::Pending);
        assert_eq!(user.leave_balance, 4);
    }
}
