//! Persistence boundary. Handlers and the leave service only ever reach
//! users and leave requests through [`LeaveStore`].

use async_trait::async_trait;

use crate::leave::lifecycle::{Decision, LifecycleError, Transition};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveWithOwner, StatusCounts};
use crate::model::user::{NewUser, User};

pub mod memory;
pub mod mysql;

pub use memory::MemoryLeaveStore;
pub use mysql::MySqlLeaveStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    /// Lost a lock or commit race; the same call may succeed when retried.
    #[error("transient storage conflict: {0}")]
    Transient(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored value is invalid: {0}")]
    Corrupt(String),
}

/// Why an atomic approve/reject did not commit.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("leave request {0} not found")]
    NotFound(u64),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Filter for leave listings joined with their owners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveQuery {
    pub status: Option<LeaveStatus>,
    pub department: Option<String>,
}

impl LeaveQuery {
    pub fn approved_in(department: Option<&str>) -> Self {
        Self {
            status: Some(LeaveStatus::Approved),
            department: department.map(str::to_string),
        }
    }
}

/// Field changes a manager can make to an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<crate::model::role::Role>,
    pub department: Option<String>,
    pub leave_balance: Option<i32>,
}

impl UserChanges {
    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(department) = self.department {
            user.department = department;
        }
        if let Some(balance) = self.leave_balance {
            user.leave_balance = balance;
        }
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// All users ordered by department, then username.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError>;

    async fn set_user_active(&self, id: u64, active: bool) -> Result<User, StoreError>;

    /// Distinct departments among all users, sorted.
    async fn departments(&self) -> Result<Vec<String>, StoreError>;

    /// Persists a validated request and returns it with its assigned id.
    async fn insert_leave(&self, leave: LeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// A user's requests, latest start date first.
    async fn leaves_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Leaves joined with their owner, ordered by department then start date.
    async fn leaves_with_owner(&self, query: &LeaveQuery) -> Result<Vec<LeaveWithOwner>, StoreError>;

    async fn status_counts(&self) -> Result<StatusCounts, StoreError>;

    /// Runs `decision` against the request and its owner as one atomic unit:
    /// the Pending check, the status write and the balance write commit
    /// together or not at all, and two concurrent callers can never both
    /// succeed for the same request.
    async fn transition(&self, leave_id: u64, decision: Decision) -> Result<Transition, TransitionError>;
}
