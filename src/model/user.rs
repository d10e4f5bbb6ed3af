use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "username": "John Doe",
    "email": "john@example.com",
    "role": "staff",
    "department": "Front Desk",
    "leave_balance": 21,
    "active": true
}))]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[schema(write_only)]
    pub password_hash: String,
    pub role: Role,
    pub department: String,
    /// remaining leave days, decremented when a request is approved
    pub leave_balance: i32,
    pub active: bool,
}

/// Fields for a user that does not exist yet; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: String,
    pub leave_balance: i32,
}

impl NewUser {
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            department: self.department,
            leave_balance: self.leave_balance,
            active: true,
        }
    }
}
