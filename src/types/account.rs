//! Account and user types
//!
//! An account belongs to exactly one user, is addressed externally by its
//! 10-digit account number, and carries a balance in currency minor units.
//! The balance is only ever mutated while the per-account lock is held for
//! that account number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// User identifier, assigned sequentially by the user store
pub type UserId = u64;

/// Internal account identifier, distinct from the external account number
pub type AccountId = u64;

/// Required length of an external account number
pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// Account number assigned to the very first account
pub const FIRST_ACCOUNT_NUMBER: &str = "1000000000";

/// Maximum number of accounts a single user may hold
pub const MAX_ACCOUNTS_PER_USER: usize = 10;

/// A registered user, the owning parent of accounts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Store-assigned user id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// When the user was registered
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Open and accepting balance operations
    InUse,
    /// Closed; rejected for every balance mutation
    Unregistered,
}

/// A user's account
///
/// The `id` is the internal store identity; the `account_number` is the
/// external 10-digit identifier used as the lock key and in every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Internal, store-assigned id
    pub id: AccountId,

    /// Owning user
    pub user_id: UserId,

    /// External 10-digit account number, globally unique and monotonically
    /// assigned
    pub account_number: String,

    /// Lifecycle status
    pub status: AccountStatus,

    /// Balance in currency minor units
    ///
    /// Never negative; a debit larger than the balance is rejected before
    /// any mutation.
    pub balance: u64,

    /// When the account was opened
    pub registered_at: DateTime<Utc>,

    /// When the account was closed, if it has been
    pub unregistered_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Debit `amount` from the balance.
    ///
    /// Callers must hold the account lock. The balance is unchanged on error.
    pub fn use_balance(&mut self, amount: u64) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::AmountExceedsBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Credit `amount` back to the balance.
    ///
    /// Callers must hold the account lock.
    pub fn cancel_balance(&mut self, amount: u64) -> Result<(), LedgerError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::internal("balance overflow on cancel"))?;
        Ok(())
    }
}

/// Plain structured account view returned to collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    /// Owning user
    pub user_id: UserId,
    /// External account number
    pub account_number: String,
    /// Lifecycle status
    pub status: AccountStatus,
    /// Balance in minor units
    pub balance: u64,
    /// When the account was opened
    pub registered_at: DateTime<Utc>,
    /// When the account was closed, if it has been
    pub unregistered_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        AccountSummary {
            user_id: account.user_id,
            account_number: account.account_number.clone(),
            status: account.status,
            balance: account.balance,
            registered_at: account.registered_at,
            unregistered_at: account.unregistered_at,
        }
    }
}
