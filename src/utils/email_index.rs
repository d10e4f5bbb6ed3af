//! Fast path for "is this email already registered?".
//!
//! A cuckoo filter answers definite negatives without touching storage, a
//! moka cache answers recent positives, and the store settles the rest. The
//! unique key on `users.email` remains the final word.

use std::sync::RwLock;
use std::time::Duration;

use anyhow::Result;
use autoscale_cuckoo_filter::CuckooFilter;
use moka::future::Cache;

use crate::store::{LeaveStore, StoreError};

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    /// true => email is TAKEN
    taken: Cache<String, bool>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// false positives possible; a poisoned filter answers "maybe"
    fn might_exist(&self, email: &str) -> bool {
        self.filter
            .read()
            .map(|filter| filter.contains(&email.to_string()))
            .unwrap_or(true)
    }

    /// Record an email that now belongs to a user.
    pub async fn insert(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&email);
        }
        self.taken.insert(email, true).await;
    }

    /// Forget an email a user has moved away from.
    pub async fn release(&self, email: &str) {
        let email = normalize(email);
        if let Ok(mut filter) = self.filter.write() {
            filter.remove(&email);
        }
        self.taken.invalidate(&email).await;
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_available(&self, email: &str, store: &dyn LeaveStore) -> Result<bool, StoreError> {
        let email = normalize(email);

        // 1. filter: fast negative
        if !self.might_exist(&email) {
            return Ok(true);
        }

        // 2. cache: fast positive
        if self.taken.get(&email).await.unwrap_or(false) {
            return Ok(false);
        }

        // 3. store fallback
        let taken = store.find_user_by_email(&email).await?.is_some();
        if taken {
            self.taken.insert(email, true).await;
        }
        Ok(!taken)
    }

    /// Load every registered email, in batches, into the filter.
    pub async fn warmup(&self, store: &dyn LeaveStore, batch_size: usize) -> Result<()> {
        let users = store.list_users().await?;
        let total = users.len();

        for batch in users.chunks(batch_size.max(1)) {
            let mut filter = self
                .filter
                .write()
                .map_err(|_| anyhow::anyhow!("email filter poisoned"))?;
            for user in batch {
                filter.add(&normalize(&user.email));
            }
        }

        tracing::info!(total, "Email filter warmup complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::model::user::NewUser;
    use crate::store::MemoryLeaveStore;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "Someone".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            department: "IT".to_string(),
            leave_balance: 21,
        }
    }

    #[actix_web::test]
    async fn warmed_up_index_sees_existing_emails() {
        let store = MemoryLeaveStore::new();
        store.insert_user(new_user("it@example.com")).await.unwrap();

        let index = EmailIndex::new();
        index.warmup(&store, 10).await.unwrap();

        assert!(!index.is_available("IT@example.com ", &store).await.unwrap());
        assert!(index.is_available("new@example.com", &store).await.unwrap());
    }

    #[actix_web::test]
    async fn released_email_becomes_available() {
        let store = MemoryLeaveStore::new();
        let index = EmailIndex::new();

        index.insert("old@example.com").await;
        assert!(!index.is_available("old@example.com", &store).await.unwrap());

        index.release("old@example.com").await;
        assert!(index.is_available("old@example.com", &store).await.unwrap());
    }
}
