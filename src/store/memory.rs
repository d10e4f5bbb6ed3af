use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::leave::lifecycle::{Decision, Transition};
use crate::model::leave_request::{LeaveRequest, LeaveWithOwner, StatusCounts};
use crate::model::user::{NewUser, User};

use super::{LeaveQuery, LeaveStore, StoreError, TransitionError, UserChanges};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    leaves: BTreeMap<u64, LeaveRequest>,
    next_user_id: u64,
    next_leave_id: u64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

/// Process-local store; every operation runs under one lock, which makes
/// `transition` atomic for concurrent callers.
#[derive(Default)]
pub struct MemoryLeaveStore {
    tables: Mutex<Tables>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| {
            (a.department.as_str(), a.username.as_str()).cmp(&(b.department.as_str(), b.username.as_str()))
        });
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email {} already exists", user.email)));
        }
        tables.next_user_id += 1;
        let user = user.into_user(tables.next_user_id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if let Some(email) = changes.email.as_deref() {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {email} already exists")));
            }
        }
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply_to(user);
        Ok(user.clone())
    }

    async fn set_user_active(&self, id: u64, active: bool) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.active = active;
        Ok(user.clone())
    }

    async fn departments(&self) -> Result<Vec<String>, StoreError> {
        let departments: BTreeSet<String> = self
            .lock()?
            .users
            .values()
            .map(|u| u.department.clone())
            .collect();
        Ok(departments.into_iter().collect())
    }

    async fn insert_leave(&self, mut leave: LeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&leave.user_id) {
            return Err(StoreError::NotFound);
        }
        tables.next_leave_id += 1;
        leave.id = tables.next_leave_id;
        tables.leaves.insert(leave.id, leave.clone());
        Ok(leave)
    }

    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.lock()?.leaves.get(&id).cloned())
    }

    async fn leaves_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut leaves: Vec<LeaveRequest> = self
            .lock()?
            .leaves
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        leaves.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(leaves)
    }

    async fn leaves_with_owner(&self, query: &LeaveQuery) -> Result<Vec<LeaveWithOwner>, StoreError> {
        let tables = self.lock()?;
        let mut rows: Vec<LeaveWithOwner> = tables
            .leaves
            .values()
            .filter(|l| query.status.is_none_or(|status| l.status == status))
            .filter_map(|l| {
                let owner = tables.users.get(&l.user_id)?;
                if query
                    .department
                    .as_deref()
                    .is_some_and(|department| owner.department != department)
                {
                    return None;
                }
                Some(LeaveWithOwner {
                    leave: l.clone(),
                    username: owner.username.clone(),
                    department: owner.department.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.department.as_str(), a.leave.start_date, a.leave.id)
                .cmp(&(b.department.as_str(), b.leave.start_date, b.leave.id))
        });
        Ok(rows)
    }

    async fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        let mut counts = StatusCounts::default();
        for leave in self.lock()?.leaves.values() {
            counts.record(leave.status, 1);
        }
        Ok(counts)
    }

    async fn transition(&self, leave_id: u64, decision: Decision) -> Result<Transition, TransitionError> {
        let mut tables = self.lock()?;

        // work on copies so a refused decision leaves the tables untouched
        let mut leave = tables
            .leaves
            .get(&leave_id)
            .cloned()
            .ok_or(TransitionError::NotFound(leave_id))?;
        let mut owner = tables
            .users
            .get(&leave.user_id)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("leave {leave_id} has no owner")))?;

        let transition = decision.apply(&mut leave, &mut owner)?;

        tables.leaves.insert(leave.id, leave);
        tables.users.insert(owner.id, owner);
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::lifecycle::LifecycleError;
    use crate::model::leave_request::LeaveStatus;
    use crate::model::role::Role;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn new_user(email: &str, department: &str, balance: i32) -> NewUser {
        NewUser {
            username: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            department: department.to_string(),
            leave_balance: balance,
        }
    }

    fn leave_for(user_id: u64, start: (u32, u32), days: i32, status: LeaveStatus) -> LeaveRequest {
        let start_date = NaiveDate::from_ymd_opt(2024, start.0, start.1).expect("valid date");
        LeaveRequest {
            id: 0,
            user_id,
            start_date,
            end_date: start_date + chrono::Duration::days(i64::from(days) - 1),
            reason: "Holiday".to_string(),
            status,
            created_at: start_date,
            days,
        }
    }

    #[actix_web::test]
    async fn rejects_duplicate_email_case_insensitively() {
        let store = MemoryLeaveStore::new();
        store
            .insert_user(new_user("john@example.com", "Front Desk", 21))
            .await
            .expect("first insert");

        match store.insert_user(new_user("JOHN@example.com", "IT", 21)).await {
            Err(StoreError::Conflict(_)) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn lists_approved_leaves_by_department_then_start() {
        let store = MemoryLeaveStore::new();
        let it = store.insert_user(new_user("it@example.com", "IT", 21)).await.unwrap();
        let desk = store
            .insert_user(new_user("desk@example.com", "Front Desk", 21))
            .await
            .unwrap();

        store.insert_leave(leave_for(it.id, (3, 1), 2, LeaveStatus::Approved)).await.unwrap();
        store.insert_leave(leave_for(desk.id, (3, 9), 2, LeaveStatus::Approved)).await.unwrap();
        store.insert_leave(leave_for(desk.id, (3, 2), 2, LeaveStatus::Approved)).await.unwrap();
        store.insert_leave(leave_for(desk.id, (3, 1), 2, LeaveStatus::Pending)).await.unwrap();

        let all = store.leaves_with_owner(&LeaveQuery::approved_in(None)).await.unwrap();
        let order: Vec<(String, u32)> = all
            .iter()
            .map(|l| (l.department.clone(), chrono::Datelike::day(&l.leave.start_date)))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Front Desk".to_string(), 2),
                ("Front Desk".to_string(), 9),
                ("IT".to_string(), 1)
            ]
        );

        let it_only = store.leaves_with_owner(&LeaveQuery::approved_in(Some("IT"))).await.unwrap();
        assert_eq!(it_only.len(), 1);
        assert_eq!(store.departments().await.unwrap(), vec!["Front Desk", "IT"]);

        let counts = store.status_counts().await.unwrap();
        assert_eq!((counts.total, counts.approved, counts.pending), (4, 3, 1));
    }

    #[actix_web::test]
    async fn refused_transition_changes_nothing() {
        let store = MemoryLeaveStore::new();
        let user = store.insert_user(new_user("a@example.com", "IT", 21)).await.unwrap();
        let leave = store
            .insert_leave(leave_for(user.id, (3, 1), 5, LeaveStatus::Pending))
            .await
            .unwrap();

        store.transition(leave.id, Decision::Reject).await.expect("rejects");
        match store.transition(leave.id, Decision::Approve).await {
            Err(TransitionError::Lifecycle(LifecycleError::AlreadyProcessed { .. })) => {}
            other => panic!("expected already processed, got {other:?}"),
        }

        let stored = store.find_leave(leave.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Rejected);
        assert_eq!(store.find_user(user.id).await.unwrap().unwrap().leave_balance, 21);

        assert!(matches!(
            store.transition(999, Decision::Approve).await,
            Err(TransitionError::NotFound(999))
        ));
    }

    #[test]
    fn concurrent_approvals_commit_once() {
        let store = Arc::new(MemoryLeaveStore::new());
        let (user, leave) = futures::executor::block_on(async {
            let user = store.insert_user(new_user("b@example.com", "IT", 21)).await.unwrap();
            let leave = store
                .insert_leave(leave_for(user.id, (5, 1), 5, LeaveStatus::Pending))
                .await
                .unwrap();
            (user, leave)
        });
        let leave_id = leave.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    futures::executor::block_on(store.transition(leave_id, Decision::Approve)).is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("thread finished"))
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        let owner = futures::executor::block_on(store.find_user(user.id)).unwrap().unwrap();
        assert_eq!(owner.leave_balance, 16);
    }
}
