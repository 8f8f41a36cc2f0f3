//! Account store
//!
//! Thread-safe account storage keyed by external account number, backed by
//! `DashMap` for fine-grained locking: operations against different account
//! numbers never contend. Reads return snapshot clones.
//!
//! The store itself does not serialize balance mutations; that is the job of
//! the lock coordinator. Callers mutate a snapshot and write it back with
//! [`AccountStore::save`] while holding the account's lock.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use crate::types::{Account, AccountStatus, UserId};

/// Thread-safe account storage keyed by account number
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<String, Account>,
    next_id: AtomicU64,
}

impl AccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Insert a new account with a store-assigned internal id.
    ///
    /// The caller is responsible for account-number uniqueness (numbers are
    /// derived monotonically by the account service).
    pub fn create(&self, user_id: UserId, account_number: String, balance: u64) -> Account {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let account = Account {
            id,
            user_id,
            account_number: account_number.clone(),
            status: AccountStatus::InUse,
            balance,
            registered_at: Utc::now(),
            unregistered_at: None,
        };
        self.accounts.insert(account_number, account.clone());
        account
    }

    /// Look up an account by its external number.
    pub fn find_by_number(&self, account_number: &str) -> Option<Account> {
        self.accounts
            .get(account_number)
            .map(|entry| entry.value().clone())
    }

    /// All accounts owned by `user_id`.
    pub fn find_by_user(&self, user_id: UserId) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of accounts owned by `user_id`.
    pub fn count_by_user(&self, user_id: UserId) -> usize {
        self.accounts
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .count()
    }

    /// Account number of the most recently created account, if any.
    ///
    /// Internal ids are assigned monotonically, so the largest id marks the
    /// newest account. Used to derive the next sequential account number.
    pub fn most_recent_account_number(&self) -> Option<String> {
        self.accounts
            .iter()
            .max_by_key(|entry| entry.value().id)
            .map(|entry| entry.value().account_number.clone())
    }

    /// Write back a (possibly mutated) account snapshot.
    pub fn save(&self, account: Account) {
        self.accounts
            .insert(account.account_number.clone(), account);
    }

    /// Snapshot of every account, in arbitrary order.
    pub fn all(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
