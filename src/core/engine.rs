//! Ledger engine
//!
//! Orchestrates the full request path for the six exposed operations:
//! request validation, per-account lock acquisition through the guarded
//! invocation wrapper, the transaction processor, and, on business failure,
//! the compensating FAIL record appended deliberately outside the lock
//! scope.

use std::sync::Arc;

use tracing::warn;

use crate::lock::{with_account_lock, LockConfig, LockCoordinator};
use crate::store::{AccountStore, LedgerStore, UserStore};
use crate::types::{
    AccountSummary, CancelBalanceRequest, LedgerError, Transaction, TransactionConfirmation,
    User, UserId, UseBalanceRequest,
};

use super::account_service::AccountService;
use super::processor::TransactionProcessor;

/// Whether a failed use resolved the account, i.e. a compensating record can
/// be attached to it. Lock contention and request validation fail before the
/// processor runs, so nothing is compensated for those either.
fn use_failure_compensates(error: &LedgerError) -> bool {
    !matches!(
        error,
        LedgerError::UserNotFound { .. }
            | LedgerError::AccountNotFound { .. }
            | LedgerError::LockUnavailable { .. }
            | LedgerError::InvalidRequest { .. }
    )
}

/// Same decision for cancel, where the prior-transaction lookup precedes
/// account resolution.
fn cancel_failure_compensates(error: &LedgerError) -> bool {
    !matches!(
        error,
        LedgerError::TransactionNotFound { .. }
            | LedgerError::AccountNotFound { .. }
            | LedgerError::LockUnavailable { .. }
            | LedgerError::InvalidRequest { .. }
    )
}

/// Front door of the account ledger system
///
/// Owns the shared stores, the lock coordinator, and the processing
/// components. Cloneable and cheap to share across tasks.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    lock: LockCoordinator,
    lock_config: LockConfig,
    users: Arc<UserStore>,
    accounts: Arc<AccountStore>,
    ledger: Arc<LedgerStore>,
    accounts_service: AccountService,
    processor: TransactionProcessor,
}

impl LedgerEngine {
    /// Create an engine with empty stores and the given lock configuration.
    pub fn new(lock_config: LockConfig) -> Self {
        let users = Arc::new(UserStore::new());
        let accounts = Arc::new(AccountStore::new());
        let ledger = Arc::new(LedgerStore::new());

        Self {
            lock: LockCoordinator::new(),
            lock_config,
            users: Arc::clone(&users),
            accounts: Arc::clone(&accounts),
            ledger: Arc::clone(&ledger),
            accounts_service: AccountService::new(Arc::clone(&users), Arc::clone(&accounts)),
            processor: TransactionProcessor::new(users, accounts, ledger),
        }
    }

    /// Start background maintenance (lock expiry sweeping).
    ///
    /// Explicit process-lifecycle step: call once after the runtime is up,
    /// before serving requests.
    pub fn start_background_tasks(&self) {
        self.lock.start_expiry_sweeper();
    }

    /// Register a new user.
    pub fn register_user(&self, name: &str) -> User {
        self.users.register(name)
    }

    /// Open a new account for a user.
    pub fn create_account(
        &self,
        user_id: UserId,
        initial_balance: u64,
    ) -> Result<AccountSummary, LedgerError> {
        self.accounts_service.create_account(user_id, initial_balance)
    }

    /// Unregister an empty account.
    pub fn close_account(
        &self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<AccountSummary, LedgerError> {
        self.accounts_service.close_account(user_id, account_number)
    }

    /// List a user's accounts.
    pub fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<AccountSummary>, LedgerError> {
        self.accounts_service.accounts_for_user(user_id)
    }

    /// Debit an account under its lock.
    ///
    /// On a business-rule rejection after the account was resolved, a
    /// compensating FAIL record is appended after the lock has been
    /// released; a failure of that secondary append is logged and never
    /// masks the original error.
    pub async fn use_balance(
        &self,
        request: UseBalanceRequest,
    ) -> Result<TransactionConfirmation, LedgerError> {
        request.validate()?;

        let outcome = with_account_lock(&self.lock, &self.lock_config, &request, || async {
            self.processor
                .use_balance(request.user_id, &request.account_number, request.amount)
        })
        .await;

        match outcome {
            Ok(transaction) => Ok(TransactionConfirmation::from(&transaction)),
            Err(error) => {
                if use_failure_compensates(&error) {
                    if let Err(secondary) = self
                        .processor
                        .record_failed_use(&request.account_number, request.amount)
                    {
                        warn!(
                            account_number = %request.account_number,
                            error = %secondary,
                            "failed to append compensating USE record"
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// Reverse a prior use in full, under the account's lock.
    ///
    /// Compensation mirrors [`LedgerEngine::use_balance`].
    pub async fn cancel_balance(
        &self,
        request: CancelBalanceRequest,
    ) -> Result<TransactionConfirmation, LedgerError> {
        request.validate()?;

        let outcome = with_account_lock(&self.lock, &self.lock_config, &request, || async {
            self.processor.cancel_balance(
                &request.transaction_id,
                &request.account_number,
                request.amount,
            )
        })
        .await;

        match outcome {
            Ok(transaction) => Ok(TransactionConfirmation::from(&transaction)),
            Err(error) => {
                if cancel_failure_compensates(&error) {
                    if let Err(secondary) = self
                        .processor
                        .record_failed_cancel(&request.account_number, request.amount)
                    {
                        warn!(
                            account_number = %request.account_number,
                            error = %secondary,
                            "failed to append compensating CANCEL record"
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// Pure ledger lookup by transaction id.
    pub fn query_transaction(&self, transaction_id: &str) -> Result<Transaction, LedgerError> {
        self.processor.query_transaction(transaction_id)
    }

    /// Snapshot of every account, for reporting.
    pub fn all_accounts(&self) -> Vec<AccountSummary> {
        self.accounts.all().iter().map(AccountSummary::from).collect()
    }

    /// Ledger records for one account, for reporting and tests.
    pub fn transactions_for_account(&self, account_number: &str) -> Vec<Transaction> {
        self.ledger.find_by_account_number(account_number)
    }
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}
