//! Request and response shapes for balance operations
//!
//! Plain structured inputs for the two guarded operations, with field-level
//! validation applied before any business logic runs. Both request shapes
//! carry the account number that must be locked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::{UserId, ACCOUNT_NUMBER_LEN};
use super::error::LedgerError;
use super::transaction::{Transaction, TransactionResult, TransactionType};

/// Smallest accepted use amount, in minor units
pub const MIN_USE_AMOUNT: u64 = 10;

/// Largest accepted use amount, in minor units
pub const MAX_USE_AMOUNT: u64 = 1_000_000_000;

fn validate_account_number(account_number: &str) -> Result<(), LedgerError> {
    if account_number.len() != ACCOUNT_NUMBER_LEN
        || !account_number.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(LedgerError::invalid_request(format!(
            "account number must be {ACCOUNT_NUMBER_LEN} digits"
        )));
    }
    Ok(())
}

/// Request to debit an account
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UseBalanceRequest {
    /// The user claiming ownership of the account
    pub user_id: UserId,
    /// External account number (also the lock key)
    pub account_number: String,
    /// Debit amount in minor units
    pub amount: u64,
}

impl UseBalanceRequest {
    /// Field-level validation; no store access.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_account_number(&self.account_number)?;
        if self.amount < MIN_USE_AMOUNT || self.amount > MAX_USE_AMOUNT {
            return Err(LedgerError::invalid_request(format!(
                "use amount must be between {MIN_USE_AMOUNT} and {MAX_USE_AMOUNT}"
            )));
        }
        Ok(())
    }
}

/// Request to cancel a prior use in full
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CancelBalanceRequest {
    /// Id of the USE transaction being reversed
    pub transaction_id: String,
    /// External account number (also the lock key)
    pub account_number: String,
    /// Amount in minor units; must equal the original amount exactly
    pub amount: u64,
}

impl CancelBalanceRequest {
    /// Field-level validation; no store access.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.transaction_id.trim().is_empty() {
            return Err(LedgerError::invalid_request(
                "transaction id must not be blank",
            ));
        }
        validate_account_number(&self.account_number)?;
        if self.amount == 0 {
            return Err(LedgerError::invalid_request(
                "cancel amount must be positive",
            ));
        }
        Ok(())
    }
}

/// Plain structured result of a guarded balance operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionConfirmation {
    /// Account the operation ran against
    pub account_number: String,
    /// USE or CANCEL
    pub transaction_type: TransactionType,
    /// SUCCESS or FAIL
    pub result: TransactionResult,
    /// Ledger id of the appended record
    pub transaction_id: String,
    /// Amount in minor units
    pub amount: u64,
    /// Balance snapshot recorded on the ledger entry
    pub balance_snapshot: u64,
    /// When the record was appended
    pub transacted_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionConfirmation {
    fn from(tx: &Transaction) -> Self {
        TransactionConfirmation {
            account_number: tx.account_number.clone(),
            transaction_type: tx.transaction_type,
            result: tx.result,
            transaction_id: tx.transaction_id.clone(),
            amount: tx.amount,
            balance_snapshot: tx.balance_snapshot,
            transacted_at: tx.transacted_at,
        }
    }
}
