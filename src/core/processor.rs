//! Transaction processor
//!
//! Validates business invariants, mutates balances, and appends ledger
//! records for "use" and "cancel" operations. The guarded entry points
//! (`use_balance`, `cancel_balance`) must be invoked while holding the
//! account's lock; the compensating-record entry points (`record_failed_use`,
//! `record_failed_cancel`) run unlocked, after the guarded operation has
//! already failed and released its lock.
//!
//! Validation is ordered: the first failing check wins and short-circuits
//! the rest.

use std::sync::Arc;

use chrono::Utc;

use crate::store::{AccountStore, LedgerStore, UserStore};
use crate::types::{
    Account, AccountStatus, LedgerError, Transaction, TransactionResult, TransactionType,
};

/// Validates, mutates, and appends ledger records for balance operations
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    users: Arc<UserStore>,
    accounts: Arc<AccountStore>,
    ledger: Arc<LedgerStore>,
}

impl TransactionProcessor {
    /// Create a processor over the shared collaborator stores.
    pub fn new(
        users: Arc<UserStore>,
        accounts: Arc<AccountStore>,
        ledger: Arc<LedgerStore>,
    ) -> Self {
        Self {
            users,
            accounts,
            ledger,
        }
    }

    /// Debit `amount` from the account and append a SUCCESS USE record.
    ///
    /// Must be called while holding the lock for `account_number`.
    ///
    /// Validation order:
    /// 1. user exists
    /// 2. account exists
    /// 3. account is owned by `user_id`
    /// 4. account status is IN_USE
    /// 5. amount does not exceed the balance
    pub fn use_balance(
        &self,
        user_id: u64,
        account_number: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        let user = self
            .users
            .find_by_id(user_id)
            .ok_or(LedgerError::UserNotFound { user_id })?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        if account.user_id != user.id {
            return Err(LedgerError::owner_mismatch(user_id, account_number));
        }
        if account.status != AccountStatus::InUse {
            return Err(LedgerError::AccountUnregistered {
                account_number: account_number.to_string(),
            });
        }

        account.use_balance(amount)?;
        self.accounts.save(account.clone());

        Ok(self.append(TransactionType::Use, TransactionResult::Success, &account, amount))
    }

    /// Reverse a prior USE in full and append a SUCCESS CANCEL record.
    ///
    /// Must be called while holding the lock for `account_number`.
    ///
    /// Validation order:
    /// 1. prior transaction exists
    /// 2. account exists
    /// 3. amounts match exactly (no partial cancellation)
    /// 4. prior transaction belongs to the target account
    /// 5. prior transaction is within the cancellation window
    pub fn cancel_balance(
        &self,
        transaction_id: &str,
        account_number: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        let prior = self
            .ledger
            .find_by_transaction_id(transaction_id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))?;

        let mut account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        if prior.amount != amount {
            return Err(LedgerError::CancelMustBeFull {
                expected: prior.amount,
                requested: amount,
            });
        }
        if prior.account_id != account.id {
            return Err(LedgerError::TransactionAccountMismatch {
                transaction_id: transaction_id.to_string(),
                account_number: account_number.to_string(),
            });
        }
        if !prior.within_cancellation_window(Utc::now()) {
            return Err(LedgerError::CancellationWindowExpired {
                transaction_id: transaction_id.to_string(),
            });
        }

        account.cancel_balance(amount)?;
        self.accounts.save(account.clone());

        Ok(self.append(
            TransactionType::Cancel,
            TransactionResult::Success,
            &account,
            amount,
        ))
    }

    /// Append a compensating FAIL USE record with the unchanged balance.
    ///
    /// Runs without the lock; the account is re-resolved, so a narrow window
    /// exists where a concurrent mutation changes the snapshotted balance.
    /// That approximation is accepted by design.
    pub fn record_failed_use(
        &self,
        account_number: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        self.record_failure(TransactionType::Use, account_number, amount)
    }

    /// Append a compensating FAIL CANCEL record with the unchanged balance.
    pub fn record_failed_cancel(
        &self,
        account_number: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        self.record_failure(TransactionType::Cancel, account_number, amount)
    }

    /// Pure ledger lookup by transaction id.
    pub fn query_transaction(&self, transaction_id: &str) -> Result<Transaction, LedgerError> {
        self.ledger
            .find_by_transaction_id(transaction_id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))
    }

    fn record_failure(
        &self,
        transaction_type: TransactionType,
        account_number: &str,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        let account = self
            .accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;

        Ok(self.append(transaction_type, TransactionResult::Fail, &account, amount))
    }

    fn append(
        &self,
        transaction_type: TransactionType,
        result: TransactionResult,
        account: &Account,
        amount: u64,
    ) -> Transaction {
        let transaction = Transaction::record(transaction_type, result, account, amount);
        self.ledger.append(transaction.clone());
        transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Fixture {
        processor: TransactionProcessor,
        users: Arc<UserStore>,
        accounts: Arc<AccountStore>,
        ledger: Arc<LedgerStore>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(UserStore::new());
        let accounts = Arc::new(AccountStore::new());
        let ledger = Arc::new(LedgerStore::new());
        let processor = TransactionProcessor::new(
            Arc::clone(&users),
            Arc::clone(&accounts),
            Arc::clone(&ledger),
        );
        Fixture {
            processor,
            users,
            accounts,
            ledger,
        }
    }

    /// Registers a user and an account, returns (user_id, account_number).
    fn seed_account(fx: &Fixture, balance: u64) -> (u64, String) {
        let user = fx.users.register("alice");
        let account = fx
            .accounts
            .create(user.id, "1000000000".to_string(), balance);
        (user.id, account.account_number)
    }

    #[test]
    fn test_use_balance_success_appends_snapshot_record() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);

        let tx = fx.processor.use_balance(user_id, &number, 10).unwrap();

        assert_eq!(tx.transaction_type, TransactionType::Use);
        assert_eq!(tx.result, TransactionResult::Success);
        assert_eq!(tx.amount, 10);
        assert_eq!(tx.balance_snapshot, 990);
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 990);
        assert_eq!(
            fx.ledger
                .find_by_transaction_id(&tx.transaction_id)
                .unwrap(),
            tx
        );
    }

    #[test]
    fn test_use_balance_unknown_user() {
        let fx = fixture();
        seed_account(&fx, 1000);

        let err = fx.processor.use_balance(99, "1000000000", 10).unwrap_err();
        assert_eq!(err, LedgerError::user_not_found(99));
        assert!(fx.ledger.len() == 0);
    }

    #[test]
    fn test_use_balance_unknown_account() {
        let fx = fixture();
        let (user_id, _) = seed_account(&fx, 1000);

        let err = fx
            .processor
            .use_balance(user_id, "9999999999", 10)
            .unwrap_err();
        assert_eq!(err, LedgerError::account_not_found("9999999999"));
    }

    #[test]
    fn test_use_balance_owner_mismatch() {
        let fx = fixture();
        let (_, number) = seed_account(&fx, 1000);
        let other = fx.users.register("bob");

        let err = fx.processor.use_balance(other.id, &number, 10).unwrap_err();
        assert_eq!(err, LedgerError::owner_mismatch(other.id, &number));
    }

    #[test]
    fn test_use_balance_unregistered_account() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 0);

        let mut account = fx.accounts.find_by_number(&number).unwrap();
        account.status = AccountStatus::Unregistered;
        fx.accounts.save(account);

        let err = fx.processor.use_balance(user_id, &number, 10).unwrap_err();
        assert!(matches!(err, LedgerError::AccountUnregistered { .. }));
    }

    #[test]
    fn test_use_balance_exceeding_balance_leaves_it_unchanged() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 100);

        let err = fx
            .processor
            .use_balance(user_id, &number, 1000)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::AmountExceedsBalance {
                balance: 100,
                requested: 1000
            }
        );
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 100);
        // The guarded operation appends nothing on failure; compensation is
        // the caller's job.
        assert!(fx.ledger.is_empty());
    }

    #[test]
    fn test_validation_order_owner_mismatch_beats_unregistered() {
        let fx = fixture();
        let (_, number) = seed_account(&fx, 0);
        let other = fx.users.register("bob");

        let mut account = fx.accounts.find_by_number(&number).unwrap();
        account.status = AccountStatus::Unregistered;
        fx.accounts.save(account);

        let err = fx.processor.use_balance(other.id, &number, 10).unwrap_err();
        assert!(matches!(err, LedgerError::OwnerMismatch { .. }));
    }

    #[test]
    fn test_cancel_balance_restores_exactly() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);
        let used = fx.processor.use_balance(user_id, &number, 100).unwrap();

        let cancelled = fx
            .processor
            .cancel_balance(&used.transaction_id, &number, 100)
            .unwrap();

        assert_eq!(cancelled.transaction_type, TransactionType::Cancel);
        assert_eq!(cancelled.result, TransactionResult::Success);
        assert_eq!(cancelled.balance_snapshot, 1000);
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 1000);
    }

    #[test]
    fn test_cancel_balance_unknown_transaction_is_not_found() {
        let fx = fixture();
        seed_account(&fx, 1000);

        let err = fx
            .processor
            .cancel_balance("missing", "1000000000", 100)
            .unwrap_err();
        assert_eq!(err, LedgerError::transaction_not_found("missing"));
    }

    #[test]
    fn test_cancel_balance_partial_amount_rejected() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);
        let used = fx.processor.use_balance(user_id, &number, 200).unwrap();

        let err = fx
            .processor
            .cancel_balance(&used.transaction_id, &number, 100)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::CancelMustBeFull {
                expected: 200,
                requested: 100
            }
        );
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 800);
    }

    #[test]
    fn test_cancel_balance_wrong_account_rejected() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);
        fx.accounts.create(user_id, "1000000001".to_string(), 0);
        let used = fx.processor.use_balance(user_id, &number, 200).unwrap();

        let err = fx
            .processor
            .cancel_balance(&used.transaction_id, "1000000001", 200)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransactionAccountMismatch { .. }
        ));
    }

    #[test]
    fn test_cancel_balance_outside_window_rejected() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);
        let used = fx.processor.use_balance(user_id, &number, 200).unwrap();

        // Age the prior transaction two years by rewriting it in the ledger
        // under the same id.
        let mut aged = used.clone();
        aged.transaction_id = "aged0000".to_string();
        aged.transacted_at = Utc::now() - Duration::days(365 * 2);
        fx.ledger.append(aged);

        let err = fx
            .processor
            .cancel_balance("aged0000", &number, 200)
            .unwrap_err();
        assert!(matches!(err, LedgerError::CancellationWindowExpired { .. }));
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 800);
    }

    #[test]
    fn test_record_failed_use_snapshots_unchanged_balance() {
        let fx = fixture();
        let (_, number) = seed_account(&fx, 100);

        let tx = fx.processor.record_failed_use(&number, 1000).unwrap();

        assert_eq!(tx.transaction_type, TransactionType::Use);
        assert_eq!(tx.result, TransactionResult::Fail);
        assert_eq!(tx.amount, 1000);
        assert_eq!(tx.balance_snapshot, 100);
        assert_eq!(fx.accounts.find_by_number(&number).unwrap().balance, 100);
    }

    #[test]
    fn test_record_failed_cancel_requires_account() {
        let fx = fixture();
        let err = fx
            .processor
            .record_failed_cancel("9999999999", 100)
            .unwrap_err();
        assert_eq!(err, LedgerError::account_not_found("9999999999"));
    }

    #[test]
    fn test_query_transaction() {
        let fx = fixture();
        let (user_id, number) = seed_account(&fx, 1000);
        let used = fx.processor.use_balance(user_id, &number, 10).unwrap();

        let found = fx
            .processor
            .query_transaction(&used.transaction_id)
            .unwrap();
        assert_eq!(found, used);

        let err = fx.processor.query_transaction("missing").unwrap_err();
        assert_eq!(err, LedgerError::transaction_not_found("missing"));
    }
}
