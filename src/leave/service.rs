use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveWithOwner, StatusCounts};
use crate::store::{LeaveQuery, LeaveStore, StoreError, TransitionError};

use super::lifecycle::{Decision, Transition};
use super::report::{self, DepartmentFilter, OverlapReport};
use super::validator::validate_and_build;

/// Leave operations as the HTTP layer sees them. Manager-only operations
/// all pass through [`AuthUser::require_manager`] before touching the store.
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    retry_attempts: u32,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, retry_attempts: u32) -> Self {
        Self {
            store,
            retry_attempts,
        }
    }

    #[instrument(skip(self, actor, reason), fields(user_id = actor.user_id))]
    pub async fn apply(
        &self,
        actor: &AuthUser,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        today: NaiveDate,
    ) -> Result<LeaveRequest, AppError> {
        let user = self
            .store
            .find_user(actor.user_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        let leave = validate_and_build(&user, start_date, end_date, reason, today).inspect_err(|e| {
            info!(error = %e, "Leave request refused");
        })?;
        let leave = self.store.insert_leave(leave).await?;

        info!(leave_id = leave.id, days = leave.days, "Leave request submitted");
        Ok(leave)
    }

    pub async fn my_leaves(&self, actor: &AuthUser) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.store.leaves_for_user(actor.user_id).await?)
    }

    /// Approves or rejects a request. A lost commit race is retried; if it
    /// keeps losing the caller gets a transient failure and nothing changed.
    #[instrument(skip(self, actor), fields(manager_id = actor.user_id))]
    pub async fn decide(
        &self,
        actor: &AuthUser,
        leave_id: u64,
        decision: Decision,
    ) -> Result<Transition, AppError> {
        actor.require_manager()?;

        let mut attempt = 0;
        loop {
            match self.store.transition(leave_id, decision).await {
                Ok(transition) => {
                    info!(
                        %decision,
                        status = %transition.status,
                        balance_after = transition.balance_after,
                        "Leave request decided"
                    );
                    return Ok(transition);
                }
                Err(TransitionError::Store(StoreError::Transient(reason)))
                    if attempt < self.retry_attempts =>
                {
                    attempt += 1;
                    warn!(attempt, %reason, "Decision lost a commit race, retrying");
                }
                Err(TransitionError::Lifecycle(err)) => {
                    warn!(error = %err, "Decision refused");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub async fn approve(&self, actor: &AuthUser, leave_id: u64) -> Result<Transition, AppError> {
        self.decide(actor, leave_id, Decision::Approve).await
    }

    pub async fn reject(&self, actor: &AuthUser, leave_id: u64) -> Result<Transition, AppError> {
        self.decide(actor, leave_id, Decision::Reject).await
    }

    /// Every request with its owner, for the manager panel.
    pub async fn panel(&self, actor: &AuthUser) -> Result<Vec<LeaveWithOwner>, AppError> {
        actor.require_manager()?;
        Ok(self.store.leaves_with_owner(&LeaveQuery::default()).await?)
    }

    pub async fn dashboard(&self, actor: &AuthUser) -> Result<StatusCounts, AppError> {
        actor.require_manager()?;
        Ok(self.store.status_counts().await?)
    }

    pub async fn overview(
        &self,
        actor: &AuthUser,
        department: DepartmentFilter,
        today: NaiveDate,
    ) -> Result<OverlapReport, AppError> {
        actor.require_manager()?;

        let approved = self
            .store
            .leaves_with_owner(&LeaveQuery::approved_in(department.department()))
            .await?;
        let departments = self.store.departments().await?;

        Ok(report::report(approved, today, departments, &department))
    }
}
