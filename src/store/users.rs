//! User store
//!
//! Thread-safe user registry backed by `DashMap`. Users are the durable
//! parents of accounts; ids are assigned sequentially on registration.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::types::{User, UserId};

/// Thread-safe user registry
#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<UserId, User>,
    next_id: AtomicU64,
}

impl UserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new user and return it with its assigned id.
    pub fn register(&self, name: &str) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    /// Look up a user by id.
    ///
    /// Returns a snapshot clone; concurrent modifications are not reflected.
    pub fn find_by_id(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).map(|entry| entry.value().clone())
    }
}
