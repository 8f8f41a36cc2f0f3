//! Account lifecycle service
//!
//! Thin CRUD layer over the account and user stores: open accounts with
//! monotonically assigned 10-digit numbers, close (unregister) empty
//! accounts, and list a user's accounts. No locking is involved here; the
//! lock serializes balance mutations only.

use std::sync::Arc;

use chrono::Utc;

use crate::store::{AccountStore, UserStore};
use crate::types::{
    AccountStatus, AccountSummary, LedgerError, User, UserId, FIRST_ACCOUNT_NUMBER,
    MAX_ACCOUNTS_PER_USER,
};

/// Account lifecycle operations
#[derive(Debug, Clone)]
pub struct AccountService {
    users: Arc<UserStore>,
    accounts: Arc<AccountStore>,
}

impl AccountService {
    /// Create the service over the shared collaborator stores.
    pub fn new(users: Arc<UserStore>, accounts: Arc<AccountStore>) -> Self {
        Self { users, accounts }
    }

    /// Open a new account for `user_id` with `initial_balance` minor units.
    ///
    /// The account number is derived from the most recently created account:
    /// its number plus one, or [`FIRST_ACCOUNT_NUMBER`] for the very first
    /// account. A user may hold at most [`MAX_ACCOUNTS_PER_USER`] accounts.
    pub fn create_account(
        &self,
        user_id: UserId,
        initial_balance: u64,
    ) -> Result<AccountSummary, LedgerError> {
        let user = self.require_user(user_id)?;

        if self.accounts.count_by_user(user.id) >= MAX_ACCOUNTS_PER_USER {
            return Err(LedgerError::MaxAccountsPerUserExceeded {
                user_id,
                limit: MAX_ACCOUNTS_PER_USER,
            });
        }

        let account_number = self.next_account_number()?;
        let account = self.accounts.create(user.id, account_number, initial_balance);
        Ok(AccountSummary::from(&account))
    }

    /// Unregister an account.
    ///
    /// The account must belong to `user_id`, must not already be
    /// unregistered, and must have a zero balance.
    pub fn close_account(
        &self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<AccountSummary, LedgerError> {
        let user = self.require_user(user_id)?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        if account.user_id != user.id {
            return Err(LedgerError::owner_mismatch(user_id, account_number));
        }
        if account.status == AccountStatus::Unregistered {
            return Err(LedgerError::AccountUnregistered {
                account_number: account_number.to_string(),
            });
        }
        if account.balance > 0 {
            return Err(LedgerError::AccountBalanceNotEmpty {
                account_number: account_number.to_string(),
                balance: account.balance,
            });
        }

        account.status = AccountStatus::Unregistered;
        account.unregistered_at = Some(Utc::now());
        self.accounts.save(account.clone());

        Ok(AccountSummary::from(&account))
    }

    /// All accounts held by `user_id`.
    pub fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<AccountSummary>, LedgerError> {
        let user = self.require_user(user_id)?;
        Ok(self
            .accounts
            .find_by_user(user.id)
            .iter()
            .map(AccountSummary::from)
            .collect())
    }

    fn require_user(&self, user_id: UserId) -> Result<User, LedgerError> {
        self.users
            .find_by_id(user_id)
            .ok_or(LedgerError::UserNotFound { user_id })
    }

    fn next_account_number(&self) -> Result<String, LedgerError> {
        match self.accounts.most_recent_account_number() {
            None => Ok(FIRST_ACCOUNT_NUMBER.to_string()),
            Some(latest) => {
                let next = latest
                    .parse::<u64>()
                    .map_err(|_| LedgerError::internal("malformed account number in store"))?
                    + 1;
                Ok(next.to_string())
            }
        }
    }
}
