//! Demo accounts for a fresh install, enabled with `SEED_DEMO_USERS=true`.

use anyhow::{Context, Result};
use tracing::info;

use crate::auth::password::hash_password;
use crate::model::{role::Role, user::NewUser};
use crate::store::LeaveStore;
use crate::utils::email_index::EmailIndex;

const DEMO_USERS: &[(&str, &str, &str, Role, &str)] = &[
    ("HR Manager", "hr@monarchhotelskenya.com", "hrpassword", Role::Manager, "Human Resources"),
    ("IT Manager", "it@monarchhotelskenya.com", "itpassword", Role::Manager, "IT"),
    ("John Doe", "john@monarchhotelskenya.com", "johnpassword", Role::Staff, "Front Desk"),
    ("Brandon Kanute", "brandon@monarchhotelskenya.com", "brandonpassword", Role::Staff, "Front Desk"),
];

/// Creates the demo users whose email is not registered yet.
pub async fn seed_demo_users(
    store: &dyn LeaveStore,
    emails: &EmailIndex,
    leave_balance: i32,
) -> Result<usize> {
    let mut created = 0;

    for &(username, email, password, role, department) in DEMO_USERS {
        if store.find_user_by_email(email).await?.is_some() {
            continue;
        }

        let password_hash = hash_password(password)
            .map_err(|e| anyhow::anyhow!("hashing demo password failed: {e}"))?;
        store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                department: department.to_string(),
                leave_balance,
            })
            .await
            .with_context(|| format!("creating demo user {email}"))?;
        emails.insert(email).await;
        created += 1;
    }

    info!(created, "Sample users created");
    Ok(created)
}
