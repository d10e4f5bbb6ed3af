use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use crate::leave::lifecycle::{Decision, Transition};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveWithOwner, StatusCounts};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};

use super::{LeaveQuery, LeaveStore, StoreError, TransitionError, UserChanges};

// MySQL server error numbers worth retrying
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

const USER_COLUMNS: &str =
    "id, username, email, password, role, department, leave_balance, active";
const LEAVE_COLUMNS: &str =
    "id, user_id, start_date, end_date, reason, status, created_at, days";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict(db_err.message().to_string());
                }
                match db_err.try_downcast_ref::<MySqlDatabaseError>().map(|e| e.number()) {
                    Some(ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK) => {
                        StoreError::Transient(db_err.message().to_string())
                    }
                    _ => StoreError::Unavailable(err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => StoreError::Transient(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    username: String,
    email: String,
    password: String,
    role: String,
    department: String,
    leave_balance: i32,
    active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StoreError::Corrupt(format!("user {} has role {:?}", row.id, row.role)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password,
            role,
            department: row.department,
            leave_balance: row.leave_balance,
            active: row.active,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    created_at: NaiveDate,
    days: i32,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!("leave {} has status {:?}", row.id, row.status))
        })?;
        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status,
            created_at: row.created_at,
            days: row.days,
        })
    }
}

#[derive(FromRow)]
struct LeaveOwnerRow {
    #[sqlx(flatten)]
    leave: LeaveRow,
    username: String,
    department: String,
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn lock_leave(
        tx: &mut Transaction<'_, MySql>,
        leave_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&mut **tx)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn lock_user(tx: &mut Transaction<'_, MySql>, user_id: u64) -> Result<User, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? FOR UPDATE");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?
            .try_into()
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY department, username");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password, role, department, leave_balance, active)
            VALUES (?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(user.leave_balance)
        .execute(&self.pool)
        .await?;

        Ok(user.into_user(result.last_insert_id()))
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut user = Self::lock_user(&mut tx, id).await?;
        changes.apply_to(&mut user);

        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, role = ?, department = ?, leave_balance = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(user.leave_balance)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn set_user_active(&self, id: u64, active: bool) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut user = Self::lock_user(&mut tx, id).await?;

        sqlx::query("UPDATE users SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        user.active = active;
        Ok(user)
    }

    async fn departments(&self) -> Result<Vec<String>, StoreError> {
        let departments = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT department FROM users ORDER BY department",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    async fn insert_leave(&self, mut leave: LeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, start_date, end_date, reason, status, created_at, days)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.user_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(leave.status.as_str())
        .bind(leave.created_at)
        .bind(leave.days)
        .execute(&self.pool)
        .await?;

        leave.id = result.last_insert_id();
        Ok(leave)
    }

    async fn find_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn leaves_for_user(&self, user_id: u64) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE user_id = ? ORDER BY start_date DESC, id DESC"
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn leaves_with_owner(&self, query: &LeaveQuery) -> Result<Vec<LeaveWithOwner>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<&str> = Vec::new();

        if let Some(status) = query.status {
            where_sql.push_str(" AND l.status = ?");
            args.push(status.as_str());
        }

        if let Some(department) = query.department.as_deref() {
            where_sql.push_str(" AND u.department = ?");
            args.push(department);
        }

        let sql = format!(
            r#"
            SELECT l.id, l.user_id, l.start_date, l.end_date, l.reason, l.status,
                   l.created_at, l.days, u.username, u.department
            FROM leave_requests l
            JOIN users u ON u.id = l.user_id
            {}
            ORDER BY u.department, l.start_date ASC, l.id ASC
            "#,
            where_sql
        );

        let mut data_q = sqlx::query_as::<_, LeaveOwnerRow>(&sql);
        for arg in args {
            data_q = data_q.bind(arg);
        }

        data_q
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                Ok(LeaveWithOwner {
                    leave: row.leave.try_into()?,
                    username: row.username,
                    department: row.department,
                })
            })
            .collect()
    }

    async fn status_counts(&self) -> Result<StatusCounts, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM leave_requests GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status = LeaveStatus::from_str(&status)
                .map_err(|_| StoreError::Corrupt(format!("unknown leave status {status:?}")))?;
            counts.record(status, count);
        }
        Ok(counts)
    }

    async fn transition(&self, leave_id: u64, decision: Decision) -> Result<Transition, TransitionError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let mut leave = Self::lock_leave(&mut tx, leave_id)
            .await?
            .ok_or(TransitionError::NotFound(leave_id))?;
        let mut owner = Self::lock_user(&mut tx, leave.user_id).await?;

        // a refusal drops `tx`, which rolls back and releases the row locks
        let transition = decision.apply(&mut leave, &mut owner)?;

        let updated = sqlx::query(
            "UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?",
        )
        .bind(leave.status.as_str())
        .bind(leave.id)
        .bind(LeaveStatus::Pending.as_str())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Transient(format!("leave {leave_id} changed concurrently")).into());
        }

        if transition.balance_delta != 0 {
            sqlx::query("UPDATE users SET leave_balance = ? WHERE id = ?")
                .bind(owner.leave_balance)
                .bind(owner.id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from)?;
        }

        tx.commit().await.map_err(StoreError::from)?;
        Ok(transition)
    }
}
